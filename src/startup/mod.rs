//! Startup event dispatch for propload.
//!
//! Listeners subscribe to the environment-prepared notification through
//! [`EnvironmentListener`] and are invoked in ascending [`order`] before the
//! host finalizes its configuration.
//!
//! [`order`]: EnvironmentListener::order

use crate::error::Result;
use crate::sources::PropertySources;
use tracing::debug;

/// Order value with the highest possible precedence.
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// Order value with the lowest possible precedence.
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Order slot of the host's primary file-based configuration loader.
pub const CONFIG_FILE_LOADER_ORDER: i32 = HIGHEST_PRECEDENCE + 10;

/// Subscriber to the environment-prepared notification.
pub trait EnvironmentListener {
	/// Lower values run first.
	fn order(&self) -> i32 {
		LOWEST_PRECEDENCE
	}

	/// Called once with the store the host is about to finalize.
	fn on_environment_prepared(&self, sources: &mut PropertySources) -> Result<()>;
}

/// Delivers the environment-prepared notification to registered listeners.
///
/// Dispatching consumes the dispatcher, so each listener sees the
/// notification at most once.
#[derive(Default)]
pub struct StartupDispatcher {
	listeners: Vec<Box<dyn EnvironmentListener>>,
}

impl StartupDispatcher {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, listener: Box<dyn EnvironmentListener>) {
		self.listeners.push(listener);
	}

	pub fn len(&self) -> usize {
		self.listeners.len()
	}

	pub fn is_empty(&self) -> bool {
		self.listeners.is_empty()
	}

	/// Run every listener in ascending order; ties keep registration order.
	///
	/// The first listener error stops the dispatch and is returned.
	pub fn dispatch_environment_prepared(mut self, sources: &mut PropertySources) -> Result<()> {
		self.listeners.sort_by_key(|listener| listener.order());

		for listener in &self.listeners {
			debug!(
				event = "environment-prepared",
				order = listener.order(),
				"Dispatching startup event"
			);
			listener.on_environment_prepared(sources)?;
		}

		Ok(())
	}
}

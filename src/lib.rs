//! Propload - discovers extra `.properties` files at startup and merges them
//! into a named configuration layer.
//!
//! This library provides:
//! - Recursive discovery of candidate file names under a resource root
//! - Resolution of `classpath:` and `file:` search locations
//! - Property-file decoding
//! - Merge-or-install into a layered configuration store
//! - Ordered, single-delivery startup listener dispatch
//!
//! # Example
//!
//! ```no_run
//! use propload::loader::{LoaderSettings, PropertiesLoader};
//! use propload::resource::FsResourceResolver;
//! use propload::sources::PropertySources;
//! use propload::startup::StartupDispatcher;
//!
//! let cwd = std::env::current_dir().unwrap();
//! let resolver = FsResourceResolver::new(vec![cwd.join("resources")], &cwd);
//! let loader = PropertiesLoader::new(LoaderSettings::default(), resolver);
//!
//! let mut dispatcher = StartupDispatcher::new();
//! dispatcher.register(Box::new(loader));
//!
//! let mut sources = PropertySources::new();
//! dispatcher.dispatch_environment_prepared(&mut sources).unwrap();
//!
//! if let Some(value) = sources.get_property("server.port") {
//!     println!("server.port = {value}");
//! }
//! ```

pub mod error;
pub mod loader;
pub mod properties;
pub mod resource;
pub mod sources;
pub mod startup;

pub use error::{PropLoadError, Result};

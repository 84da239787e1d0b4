use crate::error::{PropLoadError, Result};
use crate::loader::DEFAULT_ORDER;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Suffix a file name must end with to be discovered and loaded.
pub const DEFAULT_FILE_SUFFIX: &str = ".properties";

/// Name of the layer discovered properties are merged into.
pub const PROPERTY_SOURCE_NAME: &str = "CustomProperties";

/// Comma-delimited search locations, tried in order.
pub const DEFAULT_SEARCH_LOCATIONS: &str = "classpath:/,classpath:/config/,file:./,file:./config/";

/// File name of the optional settings file.
pub const SETTINGS_FILE_NAME: &str = ".propload.toml";

/// Contents of a `.propload.toml` file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SettingsFile {
	/// Replaces the search locations. Order is significant.
	#[serde(default)]
	pub search_locations: Option<Vec<String>>,

	/// Directories searched for `classpath:` locations; the first is scanned.
	#[serde(default)]
	pub classpath_roots: Option<Vec<PathBuf>>,

	/// Listener order relative to other startup listeners.
	#[serde(default)]
	pub order: Option<i32>,
}

/// A settings file with the path it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
	pub settings: SettingsFile,
	pub path: PathBuf,
}

/// Effective loader settings, fixed when a loader is constructed.
///
/// The file suffix and layer name are not settings; they are always
/// [`DEFAULT_FILE_SUFFIX`] and [`PROPERTY_SOURCE_NAME`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSettings {
	pub search_locations: Vec<String>,
	pub order: i32,
}

impl Default for LoaderSettings {
	fn default() -> Self {
		LoaderSettings {
			search_locations: split_locations(DEFAULT_SEARCH_LOCATIONS),
			order: DEFAULT_ORDER,
		}
	}
}

impl LoaderSettings {
	/// Apply a settings file on top of the defaults.
	pub fn from_file(file: &SettingsFile) -> Result<Self> {
		let defaults = Self::default();
		let settings = LoaderSettings {
			search_locations: file
				.search_locations
				.as_ref()
				.map(|locations| normalize_locations(locations.iter().map(String::as_str)))
				.unwrap_or(defaults.search_locations),
			order: file.order.unwrap_or(defaults.order),
		};

		settings.validate()?;
		Ok(settings)
	}

	/// Replace the search locations, keeping first occurrences only.
	pub fn with_search_locations<I, S>(mut self, locations: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let locations: Vec<S> = locations.into_iter().collect();
		self.search_locations = normalize_locations(locations.iter().map(|location| location.as_ref()));
		self
	}

	/// Check that at least one search location remains.
	pub fn validate(&self) -> Result<()> {
		if self.search_locations.is_empty() {
			return Err(PropLoadError::InvalidSettings {
				reason: "search-locations must not be empty".to_string(),
			});
		}

		Ok(())
	}
}

/// Split a comma-delimited location list, trimming entries and dropping
/// blanks and repeats.
pub fn split_locations(locations: &str) -> Vec<String> {
	normalize_locations(locations.split(','))
}

fn normalize_locations<'a>(locations: impl Iterator<Item = &'a str>) -> Vec<String> {
	let mut result: Vec<String> = Vec::new();
	for location in locations.map(str::trim).filter(|l| !l.is_empty()) {
		if !result.iter().any(|existing| existing == location) {
			result.push(location.to_string());
		}
	}
	result
}

/// Parse a settings file from the given path.
pub fn parse_settings_file(path: &Path) -> Result<SettingsFile> {
	let content = std::fs::read_to_string(path).map_err(|source| PropLoadError::SettingsRead {
		path: path.to_path_buf(),
		source,
	})?;

	parse_settings_str(&content, path)
}

/// Parse settings from a string (useful for testing).
pub fn parse_settings_str(content: &str, path: &Path) -> Result<SettingsFile> {
	toml::from_str(content).map_err(|source| PropLoadError::SettingsParse {
		path: path.to_path_buf(),
		source,
	})
}

/// Find the settings file that applies to `start_dir`.
///
/// The lookup order is:
/// 1. `.propload.toml` in `start_dir`
/// 2. `~/.propload.toml`
///
/// The first file found wins; returns `None` when neither exists.
pub fn discover_settings(start_dir: &Path) -> Result<Option<LoadedSettings>> {
	let project_path = start_dir.join(SETTINGS_FILE_NAME);
	if project_path.is_file() {
		return load_settings_at(project_path).map(Some);
	}

	// A missing home directory only matters when there is no project file
	let Ok(user_path) = user_settings_path() else {
		return Ok(None);
	};

	if user_path.is_file() {
		load_settings_at(user_path).map(Some)
	} else {
		Ok(None)
	}
}

fn load_settings_at(path: PathBuf) -> Result<LoadedSettings> {
	let settings = parse_settings_file(&path)?;
	Ok(LoadedSettings { settings, path })
}

/// Get the path to the user's settings file.
pub fn user_settings_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(PropLoadError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(SETTINGS_FILE_NAME))
}

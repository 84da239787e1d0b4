use crate::properties::ParseError;
use std::path::PathBuf;

/// Errors that end a discovery pass or a settings lookup.
///
/// Missing or misnamed config files never show up here; the loader skips
/// them, including locations that fail with `InvalidLocation`. Any error
/// returned from a pass aborts startup.
#[derive(Debug, thiserror::Error)]
pub enum PropLoadError {
	#[error("Resource root is not a readable directory: {path}")]
	EnvironmentResolution { path: PathBuf },

	#[error("Failed to walk resource directory: {path}")]
	DirectoryWalk {
		path: PathBuf,
		#[source]
		source: walkdir::Error,
	},

	#[error("Failed to read config resource: {location}")]
	ResourceRead {
		location: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse properties from: {location}")]
	PropertiesParse {
		location: String,
		#[source]
		source: ParseError,
	},

	#[error("Unsupported resource location: {location}")]
	InvalidLocation { location: String },

	#[error("Failed to read settings file: {path}")]
	SettingsRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse settings file: {path}")]
	SettingsParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid settings: {reason}")]
	InvalidSettings { reason: String },

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using PropLoadError.
pub type Result<T> = std::result::Result<T, PropLoadError>;

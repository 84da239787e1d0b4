//! Discovery and merging of extra property files.
//!
//! A pass runs in three steps:
//! - Scan the base resource directory for file names ending in the suffix
//! - Try every search location for every discovered name, in order
//! - Merge each loaded file into a single named layer

pub mod scan;
pub mod settings;

pub use scan::{CandidateNames, discover_candidates};
pub use settings::{
	DEFAULT_FILE_SUFFIX, DEFAULT_SEARCH_LOCATIONS, LoadedSettings, LoaderSettings,
	PROPERTY_SOURCE_NAME, SettingsFile, discover_settings, parse_settings_file, parse_settings_str,
	split_locations, user_settings_path,
};

use crate::error::{PropLoadError, Result};
use crate::properties::parse_properties_bytes;
use crate::resource::{FsResourceResolver, ResourceResolver};
use crate::sources::{PropertyLayer, PropertySources};
use crate::startup::{CONFIG_FILE_LOADER_ORDER, EnvironmentListener};
use tracing::{debug, warn};

/// Default listener order: just ahead of the primary config file loader.
pub const DEFAULT_ORDER: i32 = CONFIG_FILE_LOADER_ORDER - 5;

/// What happened when a single location was tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
	/// Nothing exists at the location.
	Missing,

	/// Something exists but its name lacks the suffix.
	Invalid,

	/// The file was decoded and merged.
	Loaded { keys: usize },
}

/// Summary of a discovery pass.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
	/// Names discovered under the base path.
	pub candidates: CandidateNames,

	/// Every attempted location, in attempt order.
	pub attempted: Vec<String>,

	/// Locations that were loaded and merged.
	pub loaded: Vec<String>,

	/// Locations that were skipped as missing or invalid.
	pub skipped: Vec<String>,
}

/// Merges discovered property files into the `CustomProperties` layer.
#[derive(Debug, Clone)]
pub struct PropertiesLoader<R = FsResourceResolver> {
	settings: LoaderSettings,
	resolver: R,
}

impl<R: ResourceResolver> PropertiesLoader<R> {
	pub fn new(settings: LoaderSettings, resolver: R) -> Self {
		PropertiesLoader { settings, resolver }
	}

	pub fn settings(&self) -> &LoaderSettings {
		&self.settings
	}

	pub fn resolver(&self) -> &R {
		&self.resolver
	}

	/// Scan the resolver's base path for candidate file names.
	pub fn discover(&self) -> Result<CandidateNames> {
		let base_path = self.resolver.base_path()?;
		debug!(base = %base_path.display(), "Scanning for candidate files");
		discover_candidates(&base_path, DEFAULT_FILE_SUFFIX)
	}

	/// Run one discovery pass against `sources`.
	///
	/// Every search location is combined with every discovered name, locations
	/// in the outer loop. Missing files are skipped; the first file that
	/// cannot be read or decoded aborts the pass.
	pub fn run(&self, sources: &mut PropertySources) -> Result<LoadReport> {
		let mut report = LoadReport {
			candidates: self.discover()?,
			..Default::default()
		};

		for prefix in &self.settings.search_locations {
			for name in report.candidates.iter() {
				let location = format!("{prefix}{name}");
				let outcome = self.load_one(&location, sources)?;

				match outcome {
					LoadOutcome::Loaded { .. } => report.loaded.push(location.clone()),
					LoadOutcome::Missing | LoadOutcome::Invalid => {
						report.skipped.push(location.clone())
					}
				}
				report.attempted.push(location);
			}
		}

		Ok(report)
	}

	/// Try a single location and merge it into the layer if it loads.
	pub fn load_one(&self, location: &str, sources: &mut PropertySources) -> Result<LoadOutcome> {
		let resource = match self.resolver.resolve(location) {
			Ok(resource) if resource.exists() => resource,
			Ok(_) => {
				warn!("Skipped missing config {location}");
				return Ok(LoadOutcome::Missing);
			}
			Err(err) => {
				warn!(error = %err, "Skipped missing config {location}");
				return Ok(LoadOutcome::Missing);
			}
		};

		if !resource
			.filename()
			.is_some_and(|name| name.ends_with(DEFAULT_FILE_SUFFIX))
		{
			warn!("Skipped invalid config {location}");
			return Ok(LoadOutcome::Invalid);
		}

		let resolved = resource
			.path()
			.map(|path| path.display().to_string())
			.unwrap_or_default();
		warn!(resolved = %resolved, "Custom config found: {location}");

		let bytes = resource.read_bytes()?;
		let map = parse_properties_bytes(&bytes).map_err(|source| PropLoadError::PropertiesParse {
			location: location.to_string(),
			source,
		})?;
		let keys = map.len();

		match sources.get_mut(PROPERTY_SOURCE_NAME) {
			Some(layer) => {
				debug!(layer = PROPERTY_SOURCE_NAME, keys, "Merging into existing layer");
				layer.map_mut().extend(map);
			}
			None => {
				debug!(layer = PROPERTY_SOURCE_NAME, keys, "Adding layer with lowest precedence");
				sources.add_last(PropertyLayer::new(PROPERTY_SOURCE_NAME, map));
			}
		}

		Ok(LoadOutcome::Loaded { keys })
	}
}

impl<R: ResourceResolver> EnvironmentListener for PropertiesLoader<R> {
	fn order(&self) -> i32 {
		self.settings.order
	}

	fn on_environment_prepared(&self, sources: &mut PropertySources) -> Result<()> {
		self.run(sources).map(|_| ())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::resource::Resource;
	use std::cell::RefCell;
	use std::fs;
	use std::path::{Path, PathBuf};

	/// Wraps the filesystem resolver and records every requested location.
	struct RecordingResolver {
		inner: FsResourceResolver,
		requests: RefCell<Vec<String>>,
	}

	impl ResourceResolver for RecordingResolver {
		fn base_path(&self) -> Result<PathBuf> {
			self.inner.base_path()
		}

		fn resolve(&self, location: &str) -> Result<Resource> {
			self.requests.borrow_mut().push(location.to_string());
			self.inner.resolve(location)
		}
	}

	fn write(path: &Path, content: &str) {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).unwrap();
		}
		fs::write(path, content).unwrap();
	}

	fn loader(classpath: &Path, cwd: &Path, locations: &[&str]) -> PropertiesLoader {
		let settings = LoaderSettings::default().with_search_locations(locations);
		PropertiesLoader::new(
			settings,
			FsResourceResolver::new(vec![classpath.to_path_buf()], cwd),
		)
	}

	fn recording_loader(
		classpath: &Path,
		cwd: &Path,
		locations: &[&str],
	) -> PropertiesLoader<RecordingResolver> {
		let settings = LoaderSettings::default().with_search_locations(locations);
		PropertiesLoader::new(
			settings,
			RecordingResolver {
				inner: FsResourceResolver::new(vec![classpath.to_path_buf()], cwd),
				requests: RefCell::new(Vec::new()),
			},
		)
	}

	fn custom_layer(sources: &PropertySources) -> Vec<(&str, &str)> {
		sources
			.get(PROPERTY_SOURCE_NAME)
			.unwrap()
			.map()
			.iter()
			.map(|(k, v)| (k.as_str(), v.as_str()))
			.collect()
	}

	#[test]
	fn test_tries_every_location_for_every_name_in_order() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		write(&classpath.path().join("a.properties"), "a=1");
		write(&classpath.path().join("nested/b.properties"), "b=1");

		let loader = recording_loader(classpath.path(), cwd.path(), &["P1/", "P2/", "P3/"]);
		let mut sources = PropertySources::new();
		let report = loader.run(&mut sources).unwrap();

		let expected = vec![
			"P1/a.properties",
			"P1/b.properties",
			"P2/a.properties",
			"P2/b.properties",
			"P3/a.properties",
			"P3/b.properties",
		];
		assert_eq!(*loader.resolver().requests.borrow(), expected);
		assert_eq!(report.attempted, expected);
		assert_eq!(report.skipped.len(), 6);
		assert!(sources.is_empty());
	}

	#[test]
	fn test_default_locations_load_classpath_and_working_dir() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		write(&classpath.path().join("app.properties"), "x=classpath\ny=1");
		write(&cwd.path().join("config/app.properties"), "x=cwd-config\nz=2");

		let loader = PropertiesLoader::new(
			LoaderSettings::default(),
			FsResourceResolver::new(vec![classpath.path().to_path_buf()], cwd.path()),
		);
		let mut sources = PropertySources::new();
		let report = loader.run(&mut sources).unwrap();

		assert_eq!(
			report.loaded,
			vec!["classpath:/app.properties", "file:./config/app.properties"]
		);
		assert_eq!(
			custom_layer(&sources),
			vec![("x", "cwd-config"), ("y", "1"), ("z", "2")]
		);
	}

	#[test]
	fn test_disjoint_files_are_unioned() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		write(&classpath.path().join("one.properties"), "a=1");
		write(&classpath.path().join("two.properties"), "b=2");

		let loader = loader(classpath.path(), cwd.path(), &["classpath:/"]);
		let mut sources = PropertySources::new();
		loader.run(&mut sources).unwrap();

		assert_eq!(sources.len(), 1);
		assert_eq!(custom_layer(&sources), vec![("a", "1"), ("b", "2")]);
	}

	#[test]
	fn test_later_location_wins_on_overlap() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		write(&classpath.path().join("app.properties"), "");
		write(&cwd.path().join("first/app.properties"), "x=1\nkeep=yes");
		write(&cwd.path().join("second/app.properties"), "x=2");

		let loader = loader(
			classpath.path(),
			cwd.path(),
			&["file:./first/", "file:./second/"],
		);
		let mut sources = PropertySources::new();
		loader.run(&mut sources).unwrap();

		assert_eq!(custom_layer(&sources), vec![("keep", "yes"), ("x", "2")]);
	}

	#[test]
	fn test_same_name_in_two_dirs_with_shared_source() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		write(&classpath.path().join("a/app.properties"), "x=1");
		write(&classpath.path().join("b/app.properties"), "x=2\ny=3");
		write(&cwd.path().join("shared/app.properties"), "x=2\ny=3");

		let loader = loader(
			classpath.path(),
			cwd.path(),
			&["file:./shared/", "file:shared/"],
		);
		let mut sources = PropertySources::new();
		let report = loader.run(&mut sources).unwrap();

		assert_eq!(
			report.candidates.iter().collect::<Vec<_>>(),
			vec!["app.properties"]
		);
		assert_eq!(report.loaded.len(), 2);
		assert_eq!(custom_layer(&sources), vec![("x", "2"), ("y", "3")]);
	}

	#[test]
	fn test_new_layer_does_not_override_existing_layers() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		write(&classpath.path().join("app.properties"), "x=custom\nonly=custom");

		let mut sources = PropertySources::new();
		let app = [("x".to_string(), "application".to_string())]
			.into_iter()
			.collect();
		sources.add_last(PropertyLayer::new("application", app));

		let loader = loader(classpath.path(), cwd.path(), &["classpath:/"]);
		loader.run(&mut sources).unwrap();

		let names: Vec<_> = sources.iter().map(PropertyLayer::name).collect();
		assert_eq!(names, vec!["application", PROPERTY_SOURCE_NAME]);
		assert_eq!(sources.get_property("x"), Some("application"));
		assert_eq!(sources.get_property("only"), Some("custom"));
	}

	#[test]
	fn test_existing_custom_layer_is_merged_not_replaced() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		write(&classpath.path().join("app.properties"), "x=new");

		let mut sources = PropertySources::new();
		let existing = [
			("x".to_string(), "old".to_string()),
			("kept".to_string(), "1".to_string()),
		]
		.into_iter()
		.collect();
		sources.add_last(PropertyLayer::new(PROPERTY_SOURCE_NAME, existing));
		sources.add_last(PropertyLayer::new("defaults", Default::default()));

		let loader = loader(classpath.path(), cwd.path(), &["classpath:/"]);
		loader.run(&mut sources).unwrap();

		let names: Vec<_> = sources.iter().map(PropertyLayer::name).collect();
		assert_eq!(names, vec![PROPERTY_SOURCE_NAME, "defaults"]);
		assert_eq!(custom_layer(&sources), vec![("kept", "1"), ("x", "new")]);
	}

	#[test]
	fn test_no_candidates_leaves_store_untouched() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		write(&classpath.path().join("readme.txt"), "x=1");
		write(&cwd.path().join("config/app.properties"), "x=1");

		let loader = recording_loader(
			classpath.path(),
			cwd.path(),
			&split_locations(DEFAULT_SEARCH_LOCATIONS)
				.iter()
				.map(String::as_str)
				.collect::<Vec<_>>(),
		);
		let mut sources = PropertySources::new();
		let report = loader.run(&mut sources).unwrap();

		assert!(report.candidates.is_empty());
		assert!(loader.resolver().requests.borrow().is_empty());
		assert!(sources.is_empty());
	}

	#[test]
	fn test_discovered_file_outside_prefixes_is_not_loaded() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		write(&classpath.path().join("deep/nested/app.properties"), "x=1");

		let loader = PropertiesLoader::new(
			LoaderSettings::default(),
			FsResourceResolver::new(vec![classpath.path().to_path_buf()], cwd.path()),
		);
		let mut sources = PropertySources::new();
		let report = loader.run(&mut sources).unwrap();

		assert_eq!(report.attempted.len(), 4);
		assert!(report.loaded.is_empty());
		assert!(!sources.contains(PROPERTY_SOURCE_NAME));
	}

	#[test]
	fn test_malformed_file_aborts_pass() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		write(&classpath.path().join("a.properties"), "good=1");
		write(&classpath.path().join("b.properties"), "bad=\\u12");
		write(&classpath.path().join("c.properties"), "never=1");

		let loader = recording_loader(classpath.path(), cwd.path(), &["classpath:/", "file:./"]);
		let mut sources = PropertySources::new();
		let result = loader.run(&mut sources);

		match result.unwrap_err() {
			PropLoadError::PropertiesParse { location, .. } => {
				assert_eq!(location, "classpath:/b.properties");
			}
			other => panic!("Expected PropertiesParse error, got {other:?}"),
		}
		assert_eq!(
			*loader.resolver().requests.borrow(),
			vec!["classpath:/a.properties", "classpath:/b.properties"]
		);
		assert_eq!(custom_layer(&sources), vec![("good", "1")]);
	}

	#[test]
	fn test_latin1_file_loads() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		fs::write(classpath.path().join("app.properties"), b"name=Caf\xe9\n").unwrap();

		let loader = loader(classpath.path(), cwd.path(), &["classpath:/"]);
		let mut sources = PropertySources::new();
		let report = loader.run(&mut sources).unwrap();

		assert_eq!(report.loaded, vec!["classpath:/app.properties"]);
		assert_eq!(custom_layer(&sources), vec![("name", "Café")]);
	}

	#[test]
	fn test_load_one_missing_does_not_mutate() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		let loader = loader(classpath.path(), cwd.path(), &["classpath:/"]);

		let mut sources = PropertySources::new();
		sources.add_last(PropertyLayer::new("application", Default::default()));

		let missing = loader
			.load_one("classpath:/missing.properties", &mut sources)
			.unwrap();
		let bad_scheme = loader
			.load_one("ftp://host/app.properties", &mut sources)
			.unwrap();

		assert_eq!(missing, LoadOutcome::Missing);
		assert_eq!(bad_scheme, LoadOutcome::Missing);
		assert_eq!(sources.len(), 1);
		assert!(sources.get("application").unwrap().map().is_empty());
	}

	#[test]
	fn test_load_one_skips_wrong_suffix() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		write(&classpath.path().join("notes.txt"), "x=1");

		let loader = loader(classpath.path(), cwd.path(), &["classpath:/"]);
		let mut sources = PropertySources::new();
		let outcome = loader
			.load_one("classpath:/notes.txt", &mut sources)
			.unwrap();

		assert_eq!(outcome, LoadOutcome::Invalid);
		assert!(sources.is_empty());
	}

	#[test]
	fn test_missing_base_path_is_fatal() {
		let cwd = tempfile::tempdir().unwrap();
		let loader = loader(&cwd.path().join("missing"), cwd.path(), &["classpath:/"]);

		let result = loader.run(&mut PropertySources::new());
		assert!(matches!(
			result,
			Err(PropLoadError::EnvironmentResolution { .. })
		));
	}

	#[test]
	fn test_listener_runs_pass() {
		let classpath = tempfile::tempdir().unwrap();
		let cwd = tempfile::tempdir().unwrap();
		write(&classpath.path().join("app.properties"), "x=1");

		let loader = loader(classpath.path(), cwd.path(), &["classpath:/"]);
		assert_eq!(loader.order(), DEFAULT_ORDER);
		assert!(loader.order() < CONFIG_FILE_LOADER_ORDER);

		let mut sources = PropertySources::new();
		loader.on_environment_prepared(&mut sources).unwrap();
		assert_eq!(sources.get_property("x"), Some("1"));
	}
}

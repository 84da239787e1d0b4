//! Resource resolution for propload.
//!
//! This module handles:
//! - Parsing `classpath:` / `file:` / plain location strings
//! - Mapping locations onto classpath roots or the working directory
//! - Existence checks and content reads for resolved resources

use crate::error::{PropLoadError, Result};
use std::path::{Path, PathBuf};

const CLASSPATH_PREFIX: &str = "classpath:";
const FILE_PREFIX: &str = "file:";

/// A parsed resource location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
	/// Path relative to the classpath roots.
	Classpath(String),

	/// Filesystem path, absolute or relative to the working directory.
	File(PathBuf),
}

impl Location {
	/// Parse a location string.
	///
	/// Strings without a scheme are treated as classpath locations.
	/// Single-letter schemes are taken as Windows drive letters.
	pub fn parse(location: &str) -> Result<Self> {
		if let Some(rest) = location.strip_prefix(CLASSPATH_PREFIX) {
			return Ok(Location::Classpath(rest.trim_start_matches('/').to_string()));
		}

		if let Some(rest) = location.strip_prefix(FILE_PREFIX) {
			// file:///abs/path and file:/abs/path both name /abs/path
			let path = rest.strip_prefix("//").unwrap_or(rest);
			return Ok(Location::File(PathBuf::from(path)));
		}

		if let Some((scheme, _)) = location.split_once(':')
			&& scheme.len() > 1
			&& scheme.chars().all(|c| c.is_ascii_alphabetic())
		{
			return Err(PropLoadError::InvalidLocation {
				location: location.to_string(),
			});
		}

		Ok(Location::Classpath(
			location.trim_start_matches('/').to_string(),
		))
	}
}

/// A located resource that may or may not exist.
#[derive(Debug, Clone)]
pub struct Resource {
	location: String,
	path: Option<PathBuf>,
}

impl Resource {
	pub fn new(location: impl Into<String>, path: Option<PathBuf>) -> Self {
		Resource {
			location: location.into(),
			path,
		}
	}

	/// The location string this resource was resolved from.
	pub fn location(&self) -> &str {
		&self.location
	}

	/// The filesystem path backing this resource, if any.
	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	/// Whether the resource is a readable regular file.
	pub fn exists(&self) -> bool {
		self.path.as_deref().is_some_and(Path::is_file)
	}

	/// Base name of the resource.
	pub fn filename(&self) -> Option<&str> {
		match self.path.as_deref() {
			Some(path) => path.file_name().and_then(|name| name.to_str()),
			None => self.location.rsplit('/').next().filter(|name| !name.is_empty()),
		}
	}

	/// Read the raw resource content.
	pub fn read_bytes(&self) -> Result<Vec<u8>> {
		let path = self.path.as_deref().ok_or_else(|| PropLoadError::ResourceRead {
			location: self.location.clone(),
			source: std::io::Error::from(std::io::ErrorKind::NotFound),
		})?;

		std::fs::read(path).map_err(|source| PropLoadError::ResourceRead {
			location: self.location.clone(),
			source,
		})
	}
}

/// Maps location strings to resources.
pub trait ResourceResolver {
	/// The directory that an empty classpath location resolves to.
	fn base_path(&self) -> Result<PathBuf>;

	/// Resolve a location string to a resource.
	fn resolve(&self, location: &str) -> Result<Resource>;
}

/// Resolver backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct FsResourceResolver {
	/// Directories searched for `classpath:` locations, in order.
	pub classpath_roots: Vec<PathBuf>,

	/// Directory that relative `file:` locations are resolved against.
	pub working_dir: PathBuf,
}

impl FsResourceResolver {
	pub fn new(classpath_roots: Vec<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
		FsResourceResolver {
			classpath_roots,
			working_dir: working_dir.into(),
		}
	}

	fn resolve_classpath(&self, relative: &str) -> Option<PathBuf> {
		self.classpath_roots
			.iter()
			.map(|root| root.join(relative))
			.find(|candidate| candidate.is_file())
			.or_else(|| self.classpath_roots.first().map(|root| root.join(relative)))
	}

	fn resolve_file(&self, path: &Path) -> PathBuf {
		if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.working_dir.join(path)
		}
	}
}

impl ResourceResolver for FsResourceResolver {
	fn base_path(&self) -> Result<PathBuf> {
		match self.classpath_roots.first() {
			Some(root) if root.is_dir() => Ok(root.clone()),
			Some(root) => Err(PropLoadError::EnvironmentResolution { path: root.clone() }),
			None => Err(PropLoadError::EnvironmentResolution {
				path: PathBuf::new(),
			}),
		}
	}

	fn resolve(&self, location: &str) -> Result<Resource> {
		let path = match Location::parse(location)? {
			Location::Classpath(relative) => self.resolve_classpath(&relative),
			Location::File(path) => Some(self.resolve_file(&path)),
		};
		Ok(Resource::new(location, path))
	}
}

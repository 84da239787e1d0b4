//! Recursive discovery of candidate property-file names.
//!
//! The walk collects base names only; where a name was found does not
//! matter to the loader, which tries every search location for it.

use crate::error::{PropLoadError, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Insertion-ordered set of candidate file base names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateNames {
	names: Vec<String>,
	seen: HashSet<String>,
}

impl CandidateNames {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a name, returning false if it was already present.
	pub fn insert(&mut self, name: impl Into<String>) -> bool {
		let name = name.into();
		if self.seen.contains(&name) {
			return false;
		}
		self.seen.insert(name.clone());
		self.names.push(name);
		true
	}

	pub fn contains(&self, name: &str) -> bool {
		self.seen.contains(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.names.iter().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}
}

impl<S: Into<String>> FromIterator<S> for CandidateNames {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		let mut names = CandidateNames::new();
		for name in iter {
			names.insert(name);
		}
		names
	}
}

/// Recursively collect the base names of files under `base` ending with `suffix`.
///
/// Entries are visited sorted by file name so the result order is stable.
/// Symlinks are followed; links that loop back to an ancestor and dangling
/// links are skipped with a warning. Any other traversal error, such as an
/// unreadable subdirectory, aborts the scan.
pub fn discover_candidates(base: &Path, suffix: &str) -> Result<CandidateNames> {
	let mut names = CandidateNames::new();
	let walker = WalkDir::new(base).follow_links(true).sort_by_file_name();

	for entry in walker {
		let entry = match entry {
			Ok(entry) => entry,
			Err(err) if err.loop_ancestor().is_some() => {
				warn!(path = ?err.path(), "Skipped symlink cycle");
				continue;
			}
			Err(err) if is_dangling(&err) => {
				warn!(path = ?err.path(), "Skipped dangling entry");
				continue;
			}
			Err(source) => {
				let path = source
					.path()
					.map(Path::to_path_buf)
					.unwrap_or_else(|| base.to_path_buf());
				return Err(PropLoadError::DirectoryWalk { path, source });
			}
		};

		if !entry.file_type().is_file() {
			continue;
		}

		let Some(name) = entry.file_name().to_str() else {
			debug!(path = %entry.path().display(), "Skipped non UTF-8 file name");
			continue;
		};

		if name.ends_with(suffix) && names.insert(name) {
			debug!(name, path = %entry.path().display(), "Discovered candidate");
		}
	}

	Ok(names)
}

fn is_dangling(err: &walkdir::Error) -> bool {
	err.depth() > 0
		&& err
			.io_error()
			.is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

//! On-disk layout of the feed.
//!
//! ```text
//! <root>/
//! ├── .lock                              held by the process serving the feed
//! ├── .staging/                          in-flight pushes
//! ├── .quarantine/                       entries that failed to load
//! └── <id key>/                          one directory per package id
//!     └── <version key>/                 one directory per version
//!         ├── <id key>.<version key>.nupkg
//!         ├── <id key>.nuspec
//!         └── metadata.json
//! ```
//!
//! Id and version keys are the lower-cased normalized forms, so every
//! (id, version) pair maps to exactly one directory regardless of casing or
//! build metadata. Names starting with `.` are never package ids.

use std::path::{Path, PathBuf};

use crate::package::{PackageId, PackageVersion};

/// Directory holding in-flight pushes.
pub const STAGING_DIR: &str = ".staging";

/// File locked exclusively by the process that has the feed open.
pub const LOCK_FILENAME: &str = ".lock";

/// Directory receiving entries that could not be indexed at startup.
pub const QUARANTINE_DIR: &str = ".quarantine";

/// Metadata snapshot filename inside each version directory.
pub const SNAPSHOT_FILENAME: &str = "metadata.json";

/// Extension of stored archives.
pub const ARCHIVE_EXTENSION: &str = "nupkg";

/// Paths of a feed rooted at one directory.
#[derive(Debug, Clone)]
pub struct FeedLayout {
    root: PathBuf,
}

impl FeedLayout {
    /// Create a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Feed root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding in-flight pushes.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Lock file guarding the whole feed.
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILENAME)
    }

    /// Directory receiving entries that could not be indexed.
    pub fn quarantine_dir(&self) -> PathBuf {
        self.root.join(QUARANTINE_DIR)
    }

    /// Directory holding every version of a package.
    pub fn package_dir(&self, id: &PackageId) -> PathBuf {
        self.root.join(id.key())
    }

    /// Directory holding one version of a package.
    pub fn version_dir(&self, id: &PackageId, version: &PackageVersion) -> PathBuf {
        self.package_dir(id).join(version.storage_key())
    }

    /// Whether a directory entry name under the root can be a package.
    pub fn is_package_dir_name(name: &str) -> bool {
        !name.starts_with('.')
    }
}

/// Archive filename for a package: `<id key>.<version key>.nupkg`.
pub fn archive_filename(id: &PackageId, version: &PackageVersion) -> String {
    format!("{}.{}.{}", id.key(), version.storage_key(), ARCHIVE_EXTENSION)
}

/// Stored manifest filename for a package: `<id key>.nuspec`.
pub fn manifest_filename(id: &PackageId) -> String {
    format!("{}{}", id.key(), crate::package::MANIFEST_EXTENSION)
}

//! Stored package type with feed context.
//!
//! The [`StoredPackage`] struct extends [`PackageIdentity`] with what the
//! feed store records when it accepts a push.

use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use super::core::PackageIdentity;

/// A package held by the feed.
///
/// Created exactly once per successful push and never mutated afterwards.
/// The [`Deref`] implementation gives direct access to the identity fields.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use localfeed::package::{PackageId, PackageIdentity, PackageVersion, StoredPackage};
///
/// let identity = PackageIdentity::new(PackageId::parse("Foo").unwrap(), PackageVersion::new(1, 0, 0));
/// let stored = StoredPackage::new(identity, Utc::now(), "ab12".into(), 42, "/feed/foo/1.0.0/foo.1.0.0.nupkg");
///
/// assert_eq!(stored.id.as_str(), "Foo");
/// assert_eq!(stored.size, 42);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPackage {
    /// Identity parsed from the manifest (composition).
    #[serde(flatten)]
    pub identity: PackageIdentity,

    /// When the feed accepted the package.
    #[serde(serialize_with = "serialize_timestamp")]
    pub published_at: DateTime<Utc>,

    /// Lower-case hex SHA-256 of the archive.
    pub sha256: String,

    /// Archive size in bytes.
    pub size: u64,

    /// Location of the archive file.
    #[serde(skip)]
    pub archive_path: PathBuf,
}

impl StoredPackage {
    /// Create a stored package record.
    pub fn new(
        identity: PackageIdentity,
        published_at: DateTime<Utc>,
        sha256: String,
        size: u64,
        archive_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identity,
            published_at,
            sha256,
            size,
            archive_path: archive_path.into(),
        }
    }

    /// Path to the stored archive.
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Read the archive bytes back from disk.
    pub fn read_archive(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.archive_path)
    }
}

impl Deref for StoredPackage {
    type Target = PackageIdentity;

    fn deref(&self) -> &Self::Target {
        &self.identity
    }
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Secs, true))
}

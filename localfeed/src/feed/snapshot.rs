//! Metadata snapshot read and written next to each stored archive.
//!
//! The snapshot lets listings and searches run without reopening archives.
//! It is plain JSON:
//!
//! ```text
//! {
//!   "id": "Newtonsoft.Json",
//!   "version": "13.0.3",
//!   "title": "Json.NET",
//!   "authors": "James Newton-King",
//!   "description": "...",
//!   "publishedAt": "2024-05-01T12:00:00Z",
//!   "sha256": "…",
//!   "size": 712345,
//!   "archive": "newtonsoft.json.13.0.3.nupkg"
//! }
//! ```

use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{StoreError, StoreResult};
use super::layout::SNAPSHOT_FILENAME;
use crate::package::{PackageId, PackageIdentity, PackageVersion, StoredPackage};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    id: String,
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    published_at: String,
    sha256: String,
    size: u64,
    archive: String,
}

/// Lower-case hex SHA-256 of a byte slice.
pub fn calculate_sha256(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Serialize the snapshot of a stored package.
pub fn encode_snapshot(package: &StoredPackage) -> StoreResult<Vec<u8>> {
    let archive = package
        .archive_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let snapshot = Snapshot {
        id: package.id.as_str().to_string(),
        version: package.version.to_string(),
        title: package.title.clone(),
        authors: package.authors.clone(),
        description: package.description.clone(),
        published_at: package
            .published_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        sha256: package.sha256.clone(),
        size: package.size,
        archive,
    };

    serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::InvalidSnapshot {
        path: package.archive_path.clone(),
        reason: e.to_string(),
    })
}

/// Read the snapshot in `version_dir` back into a [`StoredPackage`].
///
/// The archive it names must exist; a snapshot pointing at a missing
/// archive is reported as invalid.
pub fn read_snapshot(version_dir: &Path) -> StoreResult<StoredPackage> {
    let path = version_dir.join(SNAPSHOT_FILENAME);
    let bytes = fs::read(&path).map_err(|e| StoreError::ReadFailed {
        path: path.clone(),
        source: e,
    })?;

    let invalid = |reason: String| StoreError::InvalidSnapshot {
        path: path.clone(),
        reason,
    };

    let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))?;

    let id = PackageId::parse(&snapshot.id).map_err(|e| invalid(e.to_string()))?;
    let version = PackageVersion::parse(&snapshot.version).map_err(|e| invalid(e.to_string()))?;
    let published_at = DateTime::parse_from_rfc3339(&snapshot.published_at)
        .map_err(|e| invalid(format!("invalid timestamp: {}", e)))?
        .with_timezone(&Utc);

    if snapshot.archive.is_empty() || snapshot.archive.contains(['/', '\\']) {
        return Err(invalid(format!(
            "invalid archive name '{}'",
            snapshot.archive
        )));
    }
    let archive_path = version_dir.join(&snapshot.archive);
    if !archive_path.is_file() {
        return Err(invalid(format!(
            "archive {} is missing",
            archive_path.display()
        )));
    }

    let mut identity = PackageIdentity::new(id, version);
    identity.title = snapshot.title;
    identity.authors = snapshot.authors;
    identity.description = snapshot.description;

    Ok(StoredPackage::new(
        identity,
        published_at,
        snapshot.sha256,
        snapshot.size,
        archive_path,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stored(dir: &Path) -> StoredPackage {
        let identity = PackageIdentity::new(
            PackageId::parse("Foo").unwrap(),
            PackageVersion::parse("1.0.0+ci.7").unwrap(),
        )
        .with_description("a package");
        StoredPackage::new(
            identity,
            Utc::now(),
            calculate_sha256(b"archive"),
            7,
            dir.join("foo.1.0.0.nupkg"),
        )
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            calculate_sha256(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_snapshot_preserves_fields() {
        let temp = TempDir::new().unwrap();
        let original = stored(temp.path());
        fs::write(&original.archive_path, b"archive").unwrap();
        fs::write(
            temp.path().join(SNAPSHOT_FILENAME),
            encode_snapshot(&original).unwrap(),
        )
        .unwrap();

        let loaded = read_snapshot(temp.path()).unwrap();
        assert_eq!(loaded.identity, original.identity);
        assert_eq!(loaded.version.to_string(), "1.0.0+ci.7");
        assert_eq!(loaded.description.as_deref(), Some("a package"));
        assert_eq!(loaded.sha256, original.sha256);
        assert_eq!(loaded.archive_path, original.archive_path);
        assert_eq!(
            loaded.published_at.timestamp_millis(),
            original.published_at.timestamp_millis()
        );
    }

    #[test]
    fn test_snapshot_without_archive_is_invalid() {
        let temp = TempDir::new().unwrap();
        let original = stored(temp.path());
        fs::write(
            temp.path().join(SNAPSHOT_FILENAME),
            encode_snapshot(&original).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            read_snapshot(temp.path()),
            Err(StoreError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn test_missing_snapshot_is_read_failure() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            read_snapshot(temp.path()),
            Err(StoreError::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_garbage_snapshot_is_invalid() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SNAPSHOT_FILENAME), b"{not json").unwrap();
        assert!(matches!(
            read_snapshot(temp.path()),
            Err(StoreError::InvalidSnapshot { .. })
        ));
    }
}

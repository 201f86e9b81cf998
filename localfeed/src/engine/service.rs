//! Feed engine: the production [`PackageService`].
//!
//! A push moves through a fixed sequence of stages:
//!
//! ```text
//! Received ──► Extracted ──► Parsed ──► ConflictChecked ──► Persisted ──► Completed
//!    │             │            │               │                │
//!    ▼             ▼            ▼               ▼                ▼
//! CorruptArchive  InvalidManifest          VersionConflict   StoreIoFailure
//! AmbiguousManifest                                          VersionConflict (lost race)
//! ```
//!
//! The conflict check before persisting is a fast path. The store re-checks
//! under its index lock, so a push that loses a race still reports a
//! conflict rather than overwriting.

use std::fmt;

use tracing::{debug, info, warn};

use super::error::{FeedError, FeedResult};
use super::traits::PackageService;
use crate::feed::{FeedStore, StoreError};
use crate::package::{
    parse_manifest, read_manifest, PackageId, PackageIdentity, PackageVersion, StoredPackage,
};

/// Stage a push has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStage {
    /// Bytes received from the caller.
    Received,
    /// Manifest pulled out of the archive.
    Extracted,
    /// Manifest parsed into an identity.
    Parsed,
    /// No stored version with the same identity.
    ConflictChecked,
    /// Archive and metadata committed to the store.
    Persisted,
    /// Push finished.
    Completed,
}

impl fmt::Display for PushStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PushStage::Received => "received",
            PushStage::Extracted => "extracted",
            PushStage::Parsed => "parsed",
            PushStage::ConflictChecked => "conflict-checked",
            PushStage::Persisted => "persisted",
            PushStage::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Orchestrates archive reading, manifest parsing and storage.
#[derive(Debug)]
pub struct FeedEngine {
    store: FeedStore,
}

impl FeedEngine {
    /// Create an engine over an opened store.
    pub fn new(store: FeedStore) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &FeedStore {
        &self.store
    }

    fn run_push(&self, content: &[u8], stage: &mut PushStage) -> FeedResult<StoredPackage> {
        let manifest = read_manifest(content)?;
        advance(stage, PushStage::Extracted);

        let identity = parse_manifest(&manifest.bytes)?;
        advance(stage, PushStage::Parsed);

        if self.store.exists(&identity.id, &identity.version) {
            return Err(FeedError::VersionConflict {
                id: identity.id.to_string(),
                version: identity.version.to_string(),
            });
        }
        advance(stage, PushStage::ConflictChecked);

        let stored = self.store.put(identity, content, &manifest.bytes)?;
        advance(stage, PushStage::Persisted);

        advance(stage, PushStage::Completed);
        Ok(stored)
    }

    fn parse_query_id(id: &str) -> FeedResult<PackageId> {
        PackageId::parse(id).map_err(|e| FeedError::InvalidPackageId {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

fn advance(stage: &mut PushStage, next: PushStage) {
    debug!(from = %stage, to = %next, "Push stage");
    *stage = next;
}

impl PackageService for FeedEngine {
    fn push(&self, filename: &str, content: &[u8]) -> FeedResult<StoredPackage> {
        let mut stage = PushStage::Received;
        debug!(filename, size = content.len(), "Push received");

        let result = self.run_push(content, &mut stage);
        match &result {
            Ok(stored) => info!(
                filename,
                id = %stored.id,
                version = %stored.version,
                "Package pushed"
            ),
            Err(e) => warn!(filename, stage = %stage, error = %e, "Push rejected"),
        }
        result
    }

    fn search(&self, query: Option<&str>) -> FeedResult<Vec<PackageIdentity>> {
        let results = self.store.search(query);
        debug!(query = query.unwrap_or(""), matches = results.len(), "Search");
        Ok(results)
    }

    fn package_versions(&self, id: &str) -> FeedResult<Vec<StoredPackage>> {
        let package_id = Self::parse_query_id(id)?;
        self.store
            .list_versions(&package_id)
            .ok_or_else(|| FeedError::NotFoundId(package_id.to_string()))
    }

    fn package_archive(&self, id: &str, version: &str) -> FeedResult<Vec<u8>> {
        let package_id = Self::parse_query_id(id)?;
        if !self.store.contains_id(&package_id) {
            return Err(FeedError::NotFoundId(package_id.to_string()));
        }

        let not_found = || FeedError::VersionNotFound {
            id: package_id.to_string(),
            version: version.to_string(),
        };
        // A version string that does not parse can never have been stored.
        let parsed = PackageVersion::parse(version).map_err(|_| not_found())?;
        let stored = self.store.get(&package_id, &parsed).ok_or_else(not_found)?;

        stored.read_archive().map_err(|e| {
            FeedError::StoreIoFailure(StoreError::ReadFailed {
                path: stored.archive_path.clone(),
                source: e,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::StoreConfig;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn nupkg(id: &str, version: &str) -> Vec<u8> {
        let manifest = format!(
            "<?xml version=\"1.0\"?><package><metadata><id>{}</id><version>{}</version>\
             <authors>Test</authors></metadata></package>",
            id, version
        );
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(format!("{}.nuspec", id), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(manifest.as_bytes()).unwrap();
        writer
            .start_file("lib/net8.0/lib.dll", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"binary").unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn engine(temp: &TempDir) -> FeedEngine {
        FeedEngine::new(FeedStore::open(StoreConfig::new(temp.path())).unwrap())
    }

    #[test]
    fn test_push_returns_stored_identity() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);

        let stored = engine.push("ignored.nupkg", &nupkg("Foo", "1.0.0")).unwrap();
        assert_eq!(stored.id.as_str(), "Foo");
        assert_eq!(stored.version.to_string(), "1.0.0");
        assert_eq!(stored.authors.as_deref(), Some("Test"));
    }

    #[test]
    fn test_push_ignores_filename() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);

        let stored = engine.push("Bar.9.9.9.nupkg", &nupkg("Foo", "1.0.0")).unwrap();
        assert_eq!(stored.id.as_str(), "Foo");
        assert!(matches!(
            engine.package_versions("Bar"),
            Err(FeedError::NotFoundId(_))
        ));
    }

    #[test]
    fn test_push_conflict() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);

        engine.push("a.nupkg", &nupkg("Foo", "1.0.0")).unwrap();
        let err = engine.push("b.nupkg", &nupkg("foo", "1.0.0")).unwrap_err();
        assert!(matches!(err, FeedError::VersionConflict { .. }));
    }

    #[test]
    fn test_push_garbage_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);

        let err = engine.push("x.nupkg", b"not a zip").unwrap_err();
        assert!(matches!(err, FeedError::CorruptArchive(_)));
        assert_eq!(engine.store().version_count(), 0);
    }

    #[test]
    fn test_package_versions_invalid_id() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);

        let err = engine.package_versions("../etc").unwrap_err();
        assert!(matches!(err, FeedError::InvalidPackageId { .. }));
        assert_eq!(err.status(), super::super::StatusCode::BadRequest);
    }

    #[test]
    fn test_package_archive() {
        let temp = TempDir::new().unwrap();
        let engine = engine(&temp);
        let bytes = nupkg("Foo", "1.0.0");
        engine.push("foo.nupkg", &bytes).unwrap();

        assert_eq!(engine.package_archive("FOO", "1.0").unwrap(), bytes);
        assert!(matches!(
            engine.package_archive("Foo", "2.0.0"),
            Err(FeedError::VersionNotFound { .. })
        ));
        assert!(matches!(
            engine.package_archive("Foo", "not-a-version"),
            Err(FeedError::VersionNotFound { .. })
        ));
        assert!(matches!(
            engine.package_archive("Bar", "1.0.0"),
            Err(FeedError::NotFoundId(_))
        ));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PushStage::ConflictChecked.to_string(), "conflict-checked");
    }
}

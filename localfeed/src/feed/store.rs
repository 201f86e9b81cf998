//! Durable feed storage.
//!
//! A push is written in three steps:
//!
//! 1. **Stage**: the archive, manifest and metadata snapshot are written and
//!    synced inside a fresh directory under `.staging/`.
//! 2. **Commit**: with the index write lock held, the store re-checks for a
//!    conflict and renames the staged directory to its final
//!    `<id>/<version>/` location. A version directory that already exists on
//!    disk is a conflict too, so the rename is the final create-if-absent
//!    check.
//! 3. **Index**: still under the lock, the entry is added to the index.
//!
//! The index lock is held for one commit attempt at a time. Backoff between
//! attempts happens with the lock released, so a failing push never stalls
//! readers or other writers.
//!
//! A failure before the rename leaves only a staging directory, which is
//! removed when its handle drops or, after a crash, when the store is next
//! opened. Readers take the index read lock, so they never see an entry whose
//! directory is not in place, nor a committed directory without its entry.
//!
//! The index only describes the disk while no other process writes to the
//! root, so [`FeedStore::open`] takes an exclusive advisory lock on
//! `<root>/.lock` and holds it for the lifetime of the store.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;

use chrono::Utc;
use fs2::FileExt;
use parking_lot::RwLock;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::config::StoreConfig;
use super::error::{StoreError, StoreResult};
use super::index::FeedIndex;
use super::layout::{archive_filename, manifest_filename, FeedLayout, SNAPSHOT_FILENAME};
use super::policy::RetryPolicy;
use super::snapshot::{calculate_sha256, encode_snapshot, read_snapshot};
use crate::package::{PackageId, PackageIdentity, PackageVersion, SortOrder, StoredPackage};

/// A push written to staging but not yet committed.
struct StagedPackage {
    dir: TempDir,
    package: StoredPackage,
}

/// Durable, indexed package storage.
///
/// Safe to share between threads; writes to the same (id, version) pair are
/// serialized by the index lock and exactly one of them succeeds.
#[derive(Debug)]
pub struct FeedStore {
    layout: FeedLayout,
    retry: RetryPolicy,
    index: RwLock<FeedIndex>,
    /// Exclusive lock on the root, released when the store drops.
    _root_lock: File,
}

impl FeedStore {
    /// Open the feed at the configured root, creating it if needed.
    ///
    /// Abandoned staging directories are removed and the index is rebuilt
    /// from the metadata snapshots on disk. Version directories whose
    /// snapshot or archive is missing or unreadable are moved to
    /// `.quarantine/` and left out of the index.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Locked`] if another process has the feed open
    /// - an I/O variant if the root or staging directory cannot be created
    ///   or the root cannot be listed
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let layout = FeedLayout::new(config.root_dir);

        create_dir_all(layout.root())?;
        let root_lock = lock_root(&layout)?;
        reset_staging(&layout.staging_dir())?;

        let index = load_index(&layout)?;
        info!(
            root = %layout.root().display(),
            packages = index.package_count(),
            versions = index.version_count(),
            "Feed store opened"
        );

        Ok(Self {
            layout,
            retry: config.retry,
            index: RwLock::new(index),
            _root_lock: root_lock,
        })
    }

    /// Feed root directory.
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// Whether the (id, version) pair is stored.
    pub fn exists(&self, id: &PackageId, version: &PackageVersion) -> bool {
        self.index.read().contains(id, version)
    }

    /// Store a package.
    ///
    /// # Errors
    ///
    /// - [`StoreError::VersionConflict`] if the pair is already stored,
    ///   including when a concurrent push of the same pair wins the race
    /// - an I/O variant if staging or committing fails after retries
    pub fn put(
        &self,
        identity: PackageIdentity,
        archive: &[u8],
        manifest: &[u8],
    ) -> StoreResult<StoredPackage> {
        if self.exists(&identity.id, &identity.version) {
            return Err(conflict(&identity));
        }

        let staged = self.with_retry("stage", || self.stage(&identity, archive, manifest))?;
        self.commit(staged)
    }

    /// Whether any version of the id is stored.
    pub fn contains_id(&self, id: &PackageId) -> bool {
        self.index.read().contains_id(id)
    }

    /// Look up one stored version.
    pub fn get(&self, id: &PackageId, version: &PackageVersion) -> Option<StoredPackage> {
        self.index.read().get(id, version).cloned()
    }

    /// All versions of a package, newest first.
    ///
    /// Returns `None` when no version of the id has been stored.
    pub fn list_versions(&self, id: &PackageId) -> Option<Vec<StoredPackage>> {
        self.index.read().versions(id, SortOrder::Descending)
    }

    /// Newest version of each package whose id contains `query`, by id.
    pub fn search(&self, query: Option<&str>) -> Vec<PackageIdentity> {
        self.index.read().search(query)
    }

    /// Number of distinct package ids stored.
    pub fn package_count(&self) -> usize {
        self.index.read().package_count()
    }

    /// Number of (id, version) pairs stored.
    pub fn version_count(&self) -> usize {
        self.index.read().version_count()
    }

    fn stage(
        &self,
        identity: &PackageIdentity,
        archive: &[u8],
        manifest: &[u8],
    ) -> StoreResult<StagedPackage> {
        let staging_root = self.layout.staging_dir();
        let dir = tempfile::Builder::new()
            .prefix("push-")
            .tempdir_in(&staging_root)
            .map_err(|e| StoreError::CreateDirectoryFailed {
                path: staging_root.clone(),
                source: e,
            })?;

        let archive_name = archive_filename(&identity.id, &identity.version);
        write_synced(&dir.path().join(&archive_name), archive)?;
        write_synced(&dir.path().join(manifest_filename(&identity.id)), manifest)?;

        let final_dir = self.layout.version_dir(&identity.id, &identity.version);
        let package = StoredPackage::new(
            identity.clone(),
            Utc::now(),
            calculate_sha256(archive),
            archive.len() as u64,
            final_dir.join(&archive_name),
        );
        write_synced(
            &dir.path().join(SNAPSHOT_FILENAME),
            &encode_snapshot(&package)?,
        )?;

        debug!(
            id = %identity.id,
            version = %identity.version,
            staging = %dir.path().display(),
            "Package staged"
        );
        Ok(StagedPackage { dir, package })
    }

    fn commit(&self, staged: StagedPackage) -> StoreResult<StoredPackage> {
        let StagedPackage { dir, package } = staged;
        let package_dir = self.layout.package_dir(&package.id);
        let target = self.layout.version_dir(&package.id, &package.version);

        self.with_retry("commit", || {
            create_dir_all(&package_dir)?;

            let mut index = self.index.write();
            if index.contains(&package.id, &package.version) {
                return Err(conflict(&package));
            }
            match fs::rename(dir.path(), &target) {
                Ok(()) => {}
                Err(e) if is_occupied(&e) => {
                    warn!(
                        id = %package.id,
                        version = %package.version,
                        path = %target.display(),
                        "Version directory exists on disk but not in the index"
                    );
                    return Err(conflict(&package));
                }
                Err(e) => {
                    return Err(StoreError::CommitFailed {
                        from: dir.path().to_path_buf(),
                        to: target.clone(),
                        source: e,
                    })
                }
            }
            index
                .insert(package.clone())
                .map_err(|rejected| conflict(&rejected))
        })?;
        // Renamed away; dropping the handle finds nothing left to remove.
        drop(dir);

        info!(
            id = %package.id,
            version = %package.version,
            size = package.size,
            "Package stored"
        );
        Ok(package)
    }

    fn with_retry<T>(
        &self,
        operation: &str,
        mut attempt: impl FnMut() -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut attempt_number = 1;
        loop {
            match attempt() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => match self.retry.delay_for_attempt(attempt_number) {
                    Some(delay) => {
                        warn!(
                            operation,
                            attempt = attempt_number,
                            error = %e,
                            "Store I/O failed, retrying"
                        );
                        thread::sleep(delay);
                        attempt_number += 1;
                    }
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
    }
}

fn conflict(identity: &PackageIdentity) -> StoreError {
    StoreError::VersionConflict {
        id: identity.id.to_string(),
        version: identity.version.to_string(),
    }
}

/// Whether a rename failed because the target directory is already populated.
fn is_occupied(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::AlreadyExists | io::ErrorKind::DirectoryNotEmpty
    )
}

/// Take the exclusive feed lock without waiting.
fn lock_root(layout: &FeedLayout) -> StoreResult<File> {
    let path = layout.lock_file();
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .map_err(|e| StoreError::WriteFailed {
            path: path.clone(),
            source: e,
        })?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(file),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(StoreError::Locked { path })
        }
        Err(e) => Err(StoreError::WriteFailed { path, source: e }),
    }
}

fn create_dir_all(path: &Path) -> StoreResult<()> {
    fs::create_dir_all(path).map_err(|e| StoreError::CreateDirectoryFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_synced(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let write_failed = |e| StoreError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    let mut file = File::create(path).map_err(write_failed)?;
    file.write_all(bytes).map_err(write_failed)?;
    file.sync_all().map_err(write_failed)
}

/// Remove leftovers of interrupted pushes and recreate the staging directory.
fn reset_staging(staging: &Path) -> StoreResult<()> {
    if staging.exists() {
        fs::remove_dir_all(staging).map_err(|e| StoreError::WriteFailed {
            path: staging.to_path_buf(),
            source: e,
        })?;
        debug!(path = %staging.display(), "Cleared staging directory");
    }
    create_dir_all(staging)
}

fn list_dirs(path: &Path) -> StoreResult<Vec<PathBuf>> {
    let read_failed = |e| StoreError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let mut dirs = Vec::new();
    for entry in fs::read_dir(path).map_err(read_failed)? {
        let entry = entry.map_err(read_failed)?;
        let entry_path = entry.path();
        if entry_path.is_dir() {
            dirs.push(entry_path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn load_index(layout: &FeedLayout) -> StoreResult<FeedIndex> {
    let mut index = FeedIndex::new();

    for package_dir in list_dirs(layout.root())? {
        let is_package = package_dir
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, FeedLayout::is_package_dir_name);
        if !is_package {
            continue;
        }

        for version_dir in list_dirs(&package_dir)? {
            let package = match read_snapshot(&version_dir) {
                Ok(package) => package,
                Err(e) => {
                    warn!(path = %version_dir.display(), error = %e, "Unreadable feed entry");
                    quarantine(layout, &version_dir);
                    continue;
                }
            };

            let expected = layout.version_dir(&package.id, &package.version);
            if expected != version_dir {
                warn!(
                    path = %version_dir.display(),
                    expected = %expected.display(),
                    "Feed entry is not where its snapshot says it belongs"
                );
                quarantine(layout, &version_dir);
                continue;
            }

            if let Err(duplicate) = index.insert(package) {
                warn!(id = %duplicate.id, version = %duplicate.version, "Duplicate feed entry");
                quarantine(layout, &version_dir);
            }
        }
    }

    Ok(index)
}

/// Move an entry that cannot be indexed out of the package tree.
fn quarantine(layout: &FeedLayout, version_dir: &Path) {
    let quarantine_root = layout.quarantine_dir();
    let name = version_dir
        .strip_prefix(layout.root())
        .map(|relative| relative.to_string_lossy().replace(['/', '\\'], "_"))
        .unwrap_or_else(|_| "entry".to_string());
    let target = quarantine_root.join(format!("{}-{}", name, Utc::now().timestamp_millis()));

    let moved = fs::create_dir_all(&quarantine_root).and_then(|_| fs::rename(version_dir, &target));
    match moved {
        Ok(()) => warn!(from = %version_dir.display(), to = %target.display(), "Quarantined feed entry"),
        Err(e) => warn!(path = %version_dir.display(), error = %e, "Failed to quarantine feed entry"),
    }
}

//! The operations the feed exposes to its callers.

use super::error::FeedResult;
use crate::package::{PackageIdentity, StoredPackage};

/// Capability set of a package feed.
///
/// The HTTP layer and the CLI depend on this trait rather than on
/// [`FeedEngine`](super::FeedEngine), so handlers can be tested against a
/// fake. Implementations must be thread-safe (`Send + Sync`): calls run
/// concurrently on independent worker threads.
pub trait PackageService: Send + Sync {
    /// Accept an uploaded archive.
    ///
    /// `filename` is only used for logging; identity comes from the
    /// manifest inside `content`.
    ///
    /// # Errors
    ///
    /// - `CorruptArchive`, `AmbiguousManifest`, `InvalidManifest` for bad uploads
    /// - `VersionConflict` if the (id, version) pair is already stored
    /// - `StoreIoFailure` if the archive could not be persisted
    fn push(&self, filename: &str, content: &[u8]) -> FeedResult<StoredPackage>;

    /// Newest version of each package whose id contains `query`, ordered by id.
    ///
    /// An empty result is success.
    fn search(&self, query: Option<&str>) -> FeedResult<Vec<PackageIdentity>>;

    /// Every version of a package, newest first.
    ///
    /// # Errors
    ///
    /// - `InvalidPackageId` if `id` fails identity validation
    /// - `NotFoundId` if no version of `id` has been pushed
    fn package_versions(&self, id: &str) -> FeedResult<Vec<StoredPackage>>;

    /// Raw archive bytes of one stored version.
    ///
    /// # Errors
    ///
    /// - `InvalidPackageId` if `id` fails identity validation
    /// - `NotFoundId` or `VersionNotFound` if nothing matches
    /// - `StoreIoFailure` if the archive cannot be read
    fn package_archive(&self, id: &str, version: &str) -> FeedResult<Vec<u8>>;
}

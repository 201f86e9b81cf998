//! Error taxonomy for engine operations.

use thiserror::Error;

use super::response::StatusCode;
use crate::feed::StoreError;
use crate::package::PackageError;

/// Result type for engine operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Why a push or query failed.
///
/// Every variant maps to one coarse [`StatusCode`] via [`FeedError::status`].
/// Validation failures and conflicts are caller errors and are never retried;
/// [`FeedError::StoreIoFailure`] is reported only after the store's own
/// bounded retries are spent.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The upload is not a readable archive or has no root-level manifest.
    #[error("corrupt package archive: {0}")]
    CorruptArchive(String),

    /// More than one manifest sits at the archive root.
    #[error("package archive contains more than one manifest: {}", .entries.join(", "))]
    AmbiguousManifest { entries: Vec<String> },

    /// The manifest is malformed or its id or version is missing or invalid.
    #[error("invalid package manifest: {0}")]
    InvalidManifest(String),

    /// The (id, version) pair is already stored.
    #[error("package {id} {version} already exists")]
    VersionConflict { id: String, version: String },

    /// No version of the id has been pushed.
    #[error("package {0} not found")]
    NotFoundId(String),

    /// The id is known but the requested version is not.
    #[error("package {id} has no version {version}")]
    VersionNotFound { id: String, version: String },

    /// A query named an id that could never have been stored.
    #[error("invalid package id '{id}': {reason}")]
    InvalidPackageId { id: String, reason: String },

    /// The feed could not be read or written.
    #[error("feed storage failure: {0}")]
    StoreIoFailure(#[source] StoreError),
}

impl FeedError {
    /// Coarse result code for the failure.
    pub fn status(&self) -> StatusCode {
        match self {
            FeedError::CorruptArchive(_)
            | FeedError::AmbiguousManifest { .. }
            | FeedError::InvalidManifest(_)
            | FeedError::InvalidPackageId { .. }
            | FeedError::StoreIoFailure(_) => StatusCode::BadRequest,
            FeedError::VersionConflict { .. } => StatusCode::Conflict,
            FeedError::NotFoundId(_) | FeedError::VersionNotFound { .. } => StatusCode::NotFound,
        }
    }
}

impl From<PackageError> for FeedError {
    fn from(err: PackageError) -> Self {
        match err {
            PackageError::CorruptArchive(msg) => FeedError::CorruptArchive(msg),
            PackageError::AmbiguousManifest { entries } => FeedError::AmbiguousManifest { entries },
            PackageError::InvalidManifest(msg) => FeedError::InvalidManifest(msg),
        }
    }
}

impl From<StoreError> for FeedError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { id, version } => FeedError::VersionConflict { id, version },
            other => FeedError::StoreIoFailure(other),
        }
    }
}

//! Error types for the feed store.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type for feed store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing the feed.
#[derive(Debug)]
pub enum StoreError {
    /// Failed to create a directory.
    CreateDirectoryFailed { path: PathBuf, source: io::Error },

    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to move a staged entry into place.
    CommitFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// The (id, version) pair is already stored.
    VersionConflict { id: String, version: String },

    /// A metadata snapshot on disk could not be understood.
    InvalidSnapshot { path: PathBuf, reason: String },

    /// Another process has the feed open.
    Locked { path: PathBuf },
}

impl StoreError {
    /// Whether retrying the operation might succeed.
    ///
    /// Only I/O failures qualify; a conflict or an unreadable snapshot will
    /// fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::CreateDirectoryFailed { .. }
                | StoreError::ReadFailed { .. }
                | StoreError::WriteFailed { .. }
                | StoreError::CommitFailed { .. }
        )
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::CreateDirectoryFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            StoreError::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            StoreError::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            StoreError::CommitFailed { from, to, source } => {
                write!(
                    f,
                    "failed to move {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            StoreError::VersionConflict { id, version } => {
                write!(f, "package {} {} already exists", id, version)
            }
            StoreError::InvalidSnapshot { path, reason } => {
                write!(f, "invalid metadata snapshot {}: {}", path.display(), reason)
            }
            StoreError::Locked { path } => {
                write!(
                    f,
                    "feed is in use by another process (lock held on {})",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::CreateDirectoryFailed { source, .. } => Some(source),
            StoreError::ReadFailed { source, .. } => Some(source),
            StoreError::WriteFailed { source, .. } => Some(source),
            StoreError::CommitFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

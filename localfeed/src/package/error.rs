//! Error types for reading and validating uploaded packages.

use thiserror::Error;

/// Result type for package reading operations.
pub type PackageResult<T> = Result<T, PackageError>;

/// Errors raised while turning uploaded bytes into a [`PackageIdentity`].
///
/// All of these are caller errors: they are reported immediately and never
/// retried.
///
/// [`PackageIdentity`]: super::PackageIdentity
#[derive(Debug, Error)]
pub enum PackageError {
    /// The upload is not a readable archive, or it has no root-level manifest.
    #[error("corrupt package archive: {0}")]
    CorruptArchive(String),

    /// More than one manifest sits at the archive root.
    #[error("package archive contains more than one manifest: {}", .entries.join(", "))]
    AmbiguousManifest {
        /// Names of every root-level manifest entry found.
        entries: Vec<String>,
    },

    /// The manifest is malformed, or its id or version is missing or invalid.
    #[error("invalid package manifest: {0}")]
    InvalidManifest(String),
}

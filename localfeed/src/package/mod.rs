//! Package identity types and upload parsing.
//!
//! This module turns uploaded bytes into a trusted identity and defines the
//! types every other layer shares.
//!
//! # Overview
//!
//! - **Archive reader** ([`read_manifest`]): opens the upload as a zip
//!   container and pulls out the single root-level `*.nuspec` manifest
//! - **Manifest parser** ([`parse_manifest`]): reads the manifest XML into a
//!   [`PackageIdentity`]
//! - **Version ordering** ([`PackageVersion`], [`compare`], [`sort_versions`])
//! - **Stored package** ([`StoredPackage`]): an identity plus what the feed
//!   recorded when it accepted the upload
//!
//! # Type Hierarchy
//!
//! ```text
//! PackageIdentity (base)            StoredPackage (composition)
//! ├── id: PackageId                 ├── identity: PackageIdentity  ←── contains
//! ├── version: PackageVersion       ├── published_at: DateTime<Utc>
//! ├── title: Option<String>         ├── sha256: String
//! ├── authors: Option<String>       ├── size: u64
//! └── description: Option<String>   └── archive_path: PathBuf
//! ```
//!
//! The filename an upload arrives with is never consulted: identity comes
//! from the manifest alone.

mod archive;
mod core;
mod error;
mod id;
mod manifest;
mod stored;
mod version;

pub use archive::{read_manifest, ManifestEntry, MANIFEST_EXTENSION};
pub use self::core::PackageIdentity;
pub use error::{PackageError, PackageResult};
pub use id::{PackageId, MAX_ID_LENGTH};
pub use manifest::parse_manifest;
pub use stored::StoredPackage;
pub use version::{compare, sort_versions, PackageVersion, SortOrder, MAX_VERSION_LENGTH};

//! Core package identity type.
//!
//! The [`PackageIdentity`] struct is what the manifest declares about a
//! package, shared by the parser, the feed store and every query result.

use std::fmt;

use serde::Serialize;

use super::id::PackageId;
use super::version::PackageVersion;

/// Identity and descriptive metadata of a package.
///
/// Two identities are equal when their ids are equal (case-insensitively) and
/// their versions are equal under version ordering. Descriptive fields do not
/// take part in equality.
///
/// # Example
///
/// ```
/// use localfeed::package::{PackageId, PackageIdentity, PackageVersion};
///
/// let a = PackageIdentity::new(PackageId::parse("Foo").unwrap(), PackageVersion::new(1, 0, 0));
/// let b = PackageIdentity::new(PackageId::parse("foo").unwrap(), "1.0.0+ci".parse().unwrap());
///
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageIdentity {
    /// Package id, case-insensitive.
    pub id: PackageId,

    /// Package version.
    pub version: PackageVersion,

    /// Human-friendly title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Authors, as written in the manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,

    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PackageIdentity {
    /// Create an identity without descriptive fields.
    pub fn new(id: PackageId, version: PackageVersion) -> Self {
        Self {
            id,
            version,
            title: None,
            authors: None,
            description: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the authors.
    pub fn with_authors(mut self, authors: impl Into<String>) -> Self {
        self.authors = Some(authors.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl PartialEq for PackageIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.version == other.version
    }
}

impl Eq for PackageIdentity {}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

//! Case-insensitive package ids.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use super::error::{PackageError, PackageResult};

/// Maximum length of a package id, in characters.
pub const MAX_ID_LENGTH: usize = 100;

/// Maximum length of the lower-cased id in bytes, as it is used in file names.
const MAX_KEY_BYTES: usize = 160;

/// A validated package id.
///
/// The id keeps the casing it was published with for display, while
/// equality, ordering and hashing use the lower-cased [`key`](Self::key).
///
/// # Example
///
/// ```
/// use localfeed::package::PackageId;
///
/// let id = PackageId::parse("Newtonsoft.Json").unwrap();
/// assert_eq!(id.as_str(), "Newtonsoft.Json");
/// assert_eq!(id.key(), "newtonsoft.json");
/// assert_eq!(id, PackageId::parse("NEWTONSOFT.JSON").unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct PackageId {
    display: String,
    key: String,
}

impl PackageId {
    /// Validate and normalize an id.
    ///
    /// The text is trimmed. It must be non-empty, at most
    /// [`MAX_ID_LENGTH`] characters, free of `/`, `\` and control characters,
    /// and must not start with `.`. Its lower-cased form must also fit in
    /// 160 bytes, which only matters for ids made mostly of non-ASCII letters.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::InvalidManifest`] describing the first rule
    /// the id breaks.
    pub fn parse(text: &str) -> PackageResult<Self> {
        let display = text.trim();

        if display.is_empty() {
            return Err(invalid("package id is empty"));
        }
        if display.chars().count() > MAX_ID_LENGTH {
            return Err(invalid(format!(
                "package id exceeds {} characters",
                MAX_ID_LENGTH
            )));
        }
        if display.contains(['/', '\\']) {
            return Err(invalid(format!(
                "package id '{}' contains a path separator",
                display
            )));
        }
        if display.chars().any(char::is_control) {
            return Err(invalid("package id contains control characters"));
        }
        // Dot-prefixed names are reserved for store bookkeeping.
        if display.starts_with('.') {
            return Err(invalid(format!("package id '{}' starts with '.'", display)));
        }

        let key = display.to_lowercase();
        if key.len() > MAX_KEY_BYTES {
            return Err(invalid(format!(
                "package id exceeds {} bytes when lower-cased",
                MAX_KEY_BYTES
            )));
        }

        Ok(Self {
            display: display.to_string(),
            key,
        })
    }

    /// The id as published.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Lower-cased comparison key, also used as the on-disk directory name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the id contains `query` as a case-insensitive substring.
    pub fn matches(&self, query: &str) -> bool {
        self.key.contains(&query.to_lowercase())
    }
}

fn invalid(msg: impl Into<String>) -> PackageError {
    PackageError::InvalidManifest(msg.into())
}

impl PartialEq for PackageId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PackageId {}

impl Hash for PackageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl Ord for PackageId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for PackageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl FromStr for PackageId {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PackageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display)
    }
}

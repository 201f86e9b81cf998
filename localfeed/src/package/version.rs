//! Package version parsing and ordering.
//!
//! Versions follow `major.minor.patch[.revision][-prerelease][+build]`:
//!
//! - Numeric components compare numerically (`1.10.0 > 1.9.0`); missing
//!   trailing components default to 0, so `1.2` and `1.2.0.0` are equal.
//! - A pre-release sorts before the release of the same numbers. Labels
//!   compare by semver identifier rules, case-insensitively.
//! - Build metadata is kept for display and ignored for ordering and
//!   equality: `1.0.0+a` and `1.0.0+b` are the same version.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease};
use serde::{Serialize, Serializer};

use super::error::{PackageError, PackageResult};

/// Maximum number of dot-separated numeric components.
const MAX_NUMERIC_COMPONENTS: usize = 4;

/// Maximum length of a version string, build metadata included.
///
/// Together with the id key limit this keeps `<id>.<version>.nupkg` within
/// the 255-byte file name limit.
pub const MAX_VERSION_LENGTH: usize = 64;

/// Sort direction for version lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest version first.
    Ascending,
    /// Newest version first.
    #[default]
    Descending,
}

/// A parsed package version.
///
/// Equality, ordering and hashing all use the same key: the four numeric
/// components plus the lower-cased pre-release label.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    major: u64,
    minor: u64,
    patch: u64,
    revision: u64,
    /// Pre-release label as written.
    pre: Prerelease,
    /// Lower-cased label used for comparisons.
    pre_key: Prerelease,
    build: BuildMetadata,
}

impl PackageVersion {
    /// Create a release version from its first three components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            revision: 0,
            pre: Prerelease::EMPTY,
            pre_key: Prerelease::EMPTY,
            build: BuildMetadata::EMPTY,
        }
    }

    /// Parse a version string.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::InvalidManifest`] when the text does not match
    /// the version grammar.
    pub fn parse(text: &str) -> PackageResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(invalid("version is empty"));
        }
        if text.len() > MAX_VERSION_LENGTH {
            return Err(invalid(format!(
                "version exceeds {} characters",
                MAX_VERSION_LENGTH
            )));
        }

        let (rest, build) = match text.split_once('+') {
            Some((_, "")) => return Err(invalid(format!("empty build metadata in '{}'", text))),
            Some((rest, build)) => {
                let build = BuildMetadata::new(build).map_err(|e| {
                    invalid(format!("invalid build metadata in '{}': {}", text, e))
                })?;
                (rest, build)
            }
            None => (text, BuildMetadata::EMPTY),
        };

        let (numbers, pre) = match rest.split_once('-') {
            Some((_, "")) => return Err(invalid(format!("empty pre-release label in '{}'", text))),
            Some((numbers, pre)) => {
                let pre = Prerelease::new(pre).map_err(|e| {
                    invalid(format!("invalid pre-release label in '{}': {}", text, e))
                })?;
                (numbers, pre)
            }
            None => (rest, Prerelease::EMPTY),
        };

        let components: Vec<&str> = numbers.split('.').collect();
        if components.len() > MAX_NUMERIC_COMPONENTS {
            return Err(invalid(format!(
                "'{}' has more than {} numeric components",
                text, MAX_NUMERIC_COMPONENTS
            )));
        }

        let mut parsed = [0u64; MAX_NUMERIC_COMPONENTS];
        for (slot, component) in parsed.iter_mut().zip(&components) {
            *slot = parse_component(component)
                .ok_or_else(|| invalid(format!("'{}' is not a valid version", text)))?;
        }

        let pre_key = Prerelease::new(&pre.as_str().to_ascii_lowercase())
            .map_err(|e| invalid(format!("invalid pre-release label in '{}': {}", text, e)))?;

        Ok(Self {
            major: parsed[0],
            minor: parsed[1],
            patch: parsed[2],
            revision: parsed[3],
            pre,
            pre_key,
            build,
        })
    }

    /// Major component.
    pub fn major(&self) -> u64 {
        self.major
    }

    /// Minor component.
    pub fn minor(&self) -> u64 {
        self.minor
    }

    /// Patch component.
    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// Fourth numeric component, 0 when absent.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Pre-release label as written, empty for releases.
    pub fn pre_release(&self) -> &str {
        self.pre.as_str()
    }

    /// Build metadata as written, empty when absent.
    pub fn build_metadata(&self) -> &str {
        self.build.as_str()
    }

    /// Whether this version carries a pre-release label.
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// Normalized form without build metadata.
    ///
    /// The revision is only printed when non-zero: `1.2.0.0` normalizes to
    /// `1.2.0`, `1.2.0.5` stays `1.2.0.5`.
    pub fn normalized(&self) -> String {
        let mut out = format!("{}.{}.{}", self.major, self.minor, self.patch);
        if self.revision != 0 {
            out.push_str(&format!(".{}", self.revision));
        }
        if !self.pre.is_empty() {
            out.push('-');
            out.push_str(self.pre.as_str());
        }
        out
    }

    /// Key used for on-disk directory names.
    ///
    /// Two versions have the same storage key exactly when they are equal.
    pub fn storage_key(&self) -> String {
        self.normalized().to_ascii_lowercase()
    }

    fn numeric(&self) -> (u64, u64, u64, u64) {
        (self.major, self.minor, self.patch, self.revision)
    }

    fn cmp_pre_release(&self, other: &Self) -> Ordering {
        match (self.pre_key.is_empty(), other.pre_key.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.pre_key.cmp(&other.pre_key),
        }
    }
}

fn parse_component(component: &str) -> Option<u64> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    component.parse().ok()
}

fn invalid(msg: impl Into<String>) -> PackageError {
    PackageError::InvalidManifest(msg.into())
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numeric()
            .cmp(&other.numeric())
            .then_with(|| self.cmp_pre_release(other))
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl Hash for PackageVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numeric().hash(state);
        self.pre_key.as_str().hash(state);
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())?;
        if !self.build.is_empty() {
            write!(f, "+{}", self.build)?;
        }
        Ok(())
    }
}

impl FromStr for PackageVersion {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PackageVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Compare two version strings.
///
/// # Errors
///
/// Returns an error if either string is not a valid version.
pub fn compare(a: &str, b: &str) -> PackageResult<Ordering> {
    Ok(PackageVersion::parse(a)?.cmp(&PackageVersion::parse(b)?))
}

/// Sort versions in place in the given direction.
pub fn sort_versions(versions: &mut [PackageVersion], order: SortOrder) {
    match order {
        SortOrder::Ascending => versions.sort(),
        SortOrder::Descending => versions.sort_by(|a, b| b.cmp(a)),
    }
}

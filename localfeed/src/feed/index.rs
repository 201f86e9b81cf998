//! In-memory projection of what the feed has stored.
//!
//! The index maps each package id key to the versions stored for it. The
//! store only inserts an entry after the version directory has been
//! committed, and holds the index write lock while doing both, so the index
//! and the disk never disagree at any point a reader can observe.

use std::collections::BTreeMap;

use crate::package::{PackageId, PackageIdentity, PackageVersion, SortOrder, StoredPackage};

/// Queryable index of stored packages.
#[derive(Debug, Default)]
pub struct FeedIndex {
    /// Id key → versions, both in ascending order.
    packages: BTreeMap<String, BTreeMap<PackageVersion, StoredPackage>>,
}

impl FeedIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the (id, version) pair is indexed.
    pub fn contains(&self, id: &PackageId, version: &PackageVersion) -> bool {
        self.get(id, version).is_some()
    }

    /// Whether any version of the id is indexed.
    pub fn contains_id(&self, id: &PackageId) -> bool {
        self.packages.contains_key(id.key())
    }

    /// Look up one stored version.
    pub fn get(&self, id: &PackageId, version: &PackageVersion) -> Option<&StoredPackage> {
        self.packages.get(id.key())?.get(version)
    }

    /// Add a stored package.
    ///
    /// Returns the package back as `Err` if its (id, version) pair is already
    /// indexed; the existing entry is left untouched.
    pub fn insert(&mut self, package: StoredPackage) -> Result<(), StoredPackage> {
        let versions = self
            .packages
            .entry(package.id.key().to_string())
            .or_default();
        if versions.contains_key(&package.version) {
            return Err(package);
        }
        versions.insert(package.version.clone(), package);
        Ok(())
    }

    /// All versions of a package in the requested order.
    ///
    /// Returns `None` when no version of the id has been stored.
    pub fn versions(&self, id: &PackageId, order: SortOrder) -> Option<Vec<StoredPackage>> {
        let versions = self.packages.get(id.key())?;
        let list = match order {
            SortOrder::Ascending => versions.values().cloned().collect(),
            SortOrder::Descending => versions.values().rev().cloned().collect(),
        };
        Some(list)
    }

    /// The newest version of every package whose id contains `query`.
    ///
    /// The match is a case-insensitive substring test; an absent or blank
    /// query matches everything. Results are ordered by id, ascending and
    /// case-insensitively.
    pub fn search(&self, query: Option<&str>) -> Vec<PackageIdentity> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        self.packages
            .values()
            .filter_map(|versions| versions.values().next_back())
            .filter(|latest| query.map_or(true, |q| latest.id.matches(q)))
            .map(|latest| latest.identity.clone())
            .collect()
    }

    /// Number of distinct package ids.
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Number of stored (id, version) pairs.
    pub fn version_count(&self) -> usize {
        self.packages.values().map(BTreeMap::len).sum()
    }
}

//! Packages touched during this server process.
//!
//! A log for display only. The engine never reads it, and search or version
//! listing never consult it.

use dashmap::DashMap;

use localfeed::package::PackageIdentity;

/// Process-scoped list of pushed or listed packages.
#[derive(Debug, Default)]
pub struct SessionPackages {
    /// `<id key>/<version key>` → identity.
    packages: DashMap<String, PackageIdentity>,
}

impl SessionPackages {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded package, by id and then newest version first.
    pub fn get(&self) -> Vec<PackageIdentity> {
        let mut packages: Vec<PackageIdentity> =
            self.packages.iter().map(|entry| entry.value().clone()).collect();
        packages.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| b.version.cmp(&a.version)));
        packages
    }

    /// Record one package, replacing an earlier record of the same identity.
    pub fn set(&self, package: PackageIdentity) {
        self.packages.insert(session_key(&package), package);
    }

    /// Record several packages.
    pub fn set_many(&self, packages: impl IntoIterator<Item = PackageIdentity>) {
        for package in packages {
            self.set(package);
        }
    }
}

fn session_key(package: &PackageIdentity) -> String {
    format!("{}/{}", package.id.key(), package.version.storage_key())
}

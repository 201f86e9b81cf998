//! Archive reader for uploaded packages.
//!
//! A package archive is a zip container with exactly one manifest
//! (`*.nuspec`) at its root. Manifests in subdirectories are ignored.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use super::error::{PackageError, PackageResult};

/// File extension of package manifests.
pub const MANIFEST_EXTENSION: &str = ".nuspec";

/// Upper bound on manifest size; anything larger is not a manifest.
const MAX_MANIFEST_BYTES: u64 = 1024 * 1024;

/// A manifest pulled out of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Entry name inside the archive.
    pub name: String,
    /// Raw manifest bytes.
    pub bytes: Vec<u8>,
}

/// Extract the root-level manifest from archive bytes.
///
/// Read-only: the bytes are opened in memory and nothing touches disk.
///
/// # Errors
///
/// - [`PackageError::CorruptArchive`] if the bytes are not a zip container,
///   the manifest cannot be read, or no root-level manifest exists
/// - [`PackageError::AmbiguousManifest`] if more than one exists
pub fn read_manifest(archive: &[u8]) -> PackageResult<ManifestEntry> {
    if archive.is_empty() {
        return Err(PackageError::CorruptArchive("archive is empty".to_string()));
    }

    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|e| PackageError::CorruptArchive(e.to_string()))?;

    let mut candidates: Vec<String> = zip
        .file_names()
        .filter(|name| is_root_manifest(name))
        .map(str::to_string)
        .collect();

    let name = match candidates.len() {
        0 => {
            return Err(PackageError::CorruptArchive(format!(
                "no {} manifest at the archive root",
                MANIFEST_EXTENSION
            )))
        }
        1 => candidates.remove(0),
        _ => {
            candidates.sort();
            return Err(PackageError::AmbiguousManifest {
                entries: candidates,
            });
        }
    };

    let entry = zip
        .by_name(&name)
        .map_err(|e| PackageError::CorruptArchive(format!("cannot open {}: {}", name, e)))?;

    if entry.size() > MAX_MANIFEST_BYTES {
        return Err(PackageError::CorruptArchive(format!(
            "manifest {} is {} bytes, limit is {}",
            name,
            entry.size(),
            MAX_MANIFEST_BYTES
        )));
    }

    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry
        .take(MAX_MANIFEST_BYTES)
        .read_to_end(&mut bytes)
        .map_err(|e| PackageError::CorruptArchive(format!("cannot read {}: {}", name, e)))?;

    Ok(ManifestEntry { name, bytes })
}

/// Whether an entry name is a manifest sitting at the archive root.
fn is_root_manifest(name: &str) -> bool {
    !name.contains(['/', '\\'])
        && name.len() > MANIFEST_EXTENSION.len()
        && name.to_ascii_lowercase().ends_with(MANIFEST_EXTENSION)
}

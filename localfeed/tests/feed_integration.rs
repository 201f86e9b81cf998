//! Integration tests for the feed engine.
//!
//! These tests drive the public [`PackageService`] operations against a real
//! feed directory:
//! - push → list versions → search round trips
//! - conflicts, including concurrent identical pushes
//! - malformed uploads
//! - index and disk agreeing across reopen
//! - one open feed per root
//!
//! Run with: `cargo test --test feed_integration`

use std::collections::BTreeSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use localfeed::engine::{FeedEngine, FeedError, PackageService, Response, StatusCode};
use localfeed::feed::{FeedStore, StoreConfig, StoreError, SNAPSHOT_FILENAME, STAGING_DIR};
use localfeed::package::{compare, sort_versions, PackageVersion, SortOrder};

// ============================================================================
// Helper Functions
// ============================================================================

fn manifest(id: &str, version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>{}</id>
    <version>{}</version>
    <title>{} package</title>
    <authors>Integration</authors>
    <description>Built by the integration tests.</description>
  </metadata>
</package>"#,
        id, version, id
    )
}

/// Build a zip archive from (entry name, contents) pairs.
fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A well-formed package archive.
fn nupkg(id: &str, version: &str) -> Vec<u8> {
    let nuspec = manifest(id, version);
    let name = format!("{}.nuspec", id);
    let entries: [(&str, &[u8]); 3] = [
        (name.as_str(), nuspec.as_bytes()),
        ("lib/net8.0/Library.dll", &b"\x4d\x5a binary"[..]),
        ("[Content_Types].xml", &b"<Types/>"[..]),
    ];
    archive(&entries)
}

fn open_engine(root: &Path) -> FeedEngine {
    FeedEngine::new(FeedStore::open(StoreConfig::new(root)).unwrap())
}

fn versions(engine: &FeedEngine, id: &str) -> Vec<String> {
    engine
        .package_versions(id)
        .unwrap()
        .iter()
        .map(|p| p.version.to_string())
        .collect()
}

/// Every archive file found under the package tree, as `id/version`.
fn archives_on_disk(root: &Path) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for package_dir in fs::read_dir(root).unwrap() {
        let package_dir = package_dir.unwrap().path();
        let name = package_dir.file_name().unwrap().to_string_lossy().to_string();
        if name.starts_with('.') || !package_dir.is_dir() {
            continue;
        }
        for version_dir in fs::read_dir(&package_dir).unwrap() {
            let version_dir = version_dir.unwrap().path();
            let has_archive = fs::read_dir(&version_dir)
                .unwrap()
                .any(|f| f.unwrap().path().extension().map_or(false, |e| e == "nupkg"));
            if has_archive {
                found.insert(format!(
                    "{}/{}",
                    name,
                    version_dir.file_name().unwrap().to_string_lossy()
                ));
            }
        }
    }
    found
}

/// Every indexed (id, version), as `id/version` keys.
fn indexed(engine: &FeedEngine) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for identity in engine.search(None).unwrap() {
        for stored in engine.package_versions(identity.id.as_str()).unwrap() {
            assert!(stored.read_archive().is_ok(), "indexed archive unreadable");
            found.insert(format!(
                "{}/{}",
                stored.id.key(),
                stored.version.storage_key()
            ));
        }
    }
    found
}

// ============================================================================
// Round Trip
// ============================================================================

#[test]
fn test_push_then_list_any_casing() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());

    engine.push("upload.nupkg", &nupkg("Foo", "1.0.0")).unwrap();

    for id in ["foo", "FOO", "Foo"] {
        assert_eq!(versions(&engine, id), vec!["1.0.0"]);
    }
}

#[test]
fn test_pushed_archive_is_stored_verbatim() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());
    let bytes = nupkg("Foo", "1.0.0");

    let stored = engine.push("upload.nupkg", &bytes).unwrap();

    assert_eq!(stored.size, bytes.len() as u64);
    assert_eq!(engine.package_archive("foo", "1.0.0").unwrap(), bytes);
    assert!(temp
        .path()
        .join("foo")
        .join("1.0.0")
        .join(SNAPSHOT_FILENAME)
        .is_file());
}

#[test]
fn test_descriptive_fields_pass_through() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());

    engine.push("upload.nupkg", &nupkg("Foo", "1.0.0")).unwrap();
    let listed = engine.package_versions("foo").unwrap();

    assert_eq!(listed[0].title.as_deref(), Some("Foo package"));
    assert_eq!(listed[0].authors.as_deref(), Some("Integration"));
    assert_eq!(
        listed[0].description.as_deref(),
        Some("Built by the integration tests.")
    );
}

// ============================================================================
// Conflicts
// ============================================================================

#[test]
fn test_second_identical_push_conflicts() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());

    engine.push("a.nupkg", &nupkg("Foo", "1.0.0")).unwrap();
    let err = engine.push("b.nupkg", &nupkg("Foo", "1.0.0")).unwrap_err();

    assert!(matches!(err, FeedError::VersionConflict { .. }));
    assert_eq!(err.status(), StatusCode::Conflict);
    assert_eq!(versions(&engine, "foo"), vec!["1.0.0"]);
}

#[test]
fn test_build_metadata_variants_conflict() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());

    engine.push("a.nupkg", &nupkg("Foo", "1.0.0+a")).unwrap();
    let err = engine.push("b.nupkg", &nupkg("Foo", "1.0.0+b")).unwrap_err();

    assert!(matches!(err, FeedError::VersionConflict { .. }));
    assert_eq!(versions(&engine, "foo"), vec!["1.0.0+a"]);
}

#[test]
fn test_concurrent_identical_pushes_single_success() {
    let temp = TempDir::new().unwrap();
    let engine = Arc::new(open_engine(temp.path()));
    let bytes = Arc::new(nupkg("Foo", "1.0.0"));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let bytes = Arc::clone(&bytes);
            thread::spawn(move || engine.push(&format!("upload-{}.nupkg", i), &bytes))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(FeedError::VersionConflict { .. })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 15);
    assert_eq!(versions(&engine, "foo"), vec!["1.0.0"]);
    assert_eq!(
        fs::read_dir(temp.path().join(STAGING_DIR)).unwrap().count(),
        0
    );
}

#[test]
fn test_concurrent_distinct_pushes_all_succeed() {
    let temp = TempDir::new().unwrap();
    let engine = Arc::new(open_engine(temp.path()));

    let handles: Vec<_> = (0..8)
        .map(|minor| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine.push("upload.nupkg", &nupkg("Foo", &format!("1.{}.0", minor)))
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(
        versions(&engine, "foo"),
        vec!["1.7.0", "1.6.0", "1.5.0", "1.4.0", "1.3.0", "1.2.0", "1.1.0", "1.0.0"]
    );
}

// ============================================================================
// Version Ordering
// ============================================================================

#[test]
fn test_version_ordering_example() {
    let mut list: Vec<PackageVersion> = ["2.0.0", "1.10.0", "2.0.0-beta", "1.9.0"]
        .iter()
        .map(|v| v.parse().unwrap())
        .collect();
    sort_versions(&mut list, SortOrder::Ascending);

    let sorted: Vec<String> = list.iter().map(ToString::to_string).collect();
    assert_eq!(sorted, vec!["1.9.0", "1.10.0", "2.0.0-beta", "2.0.0"]);
    assert!(compare("1.10.0", "1.9.0").unwrap().is_gt());
}

#[test]
fn test_listed_versions_newest_first() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());

    for version in ["1.9.0", "2.0.0", "1.10.0", "2.0.0-beta"] {
        engine.push("upload.nupkg", &nupkg("Foo", version)).unwrap();
    }

    assert_eq!(
        versions(&engine, "foo"),
        vec!["2.0.0", "2.0.0-beta", "1.10.0", "1.9.0"]
    );
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn test_search_substring_and_all() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());

    engine.push("a.nupkg", &nupkg("NUnit", "3.14.0")).unwrap();
    engine
        .push("b.nupkg", &nupkg("Newtonsoft.Json", "13.0.3"))
        .unwrap();

    let json: Vec<String> = engine
        .search(Some("json"))
        .unwrap()
        .iter()
        .map(|p| p.id.to_string())
        .collect();
    assert_eq!(json, vec!["Newtonsoft.Json"]);

    let all: Vec<String> = engine
        .search(None)
        .unwrap()
        .iter()
        .map(|p| p.id.to_string())
        .collect();
    assert_eq!(all, vec!["Newtonsoft.Json", "NUnit"]);
}

#[test]
fn test_search_without_match_is_ok_and_empty() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());

    let response = Response::from(engine.search(Some("anything")));
    assert_eq!(response.status_code, StatusCode::Ok);
    assert_eq!(response.data.map(|d| d.len()), Some(0));

    engine.push("a.nupkg", &nupkg("NUnit", "3.14.0")).unwrap();
    assert!(engine.search(Some("json")).unwrap().is_empty());
}

// ============================================================================
// Not Found and Malformed Input
// ============================================================================

#[test]
fn test_unknown_id_not_found() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());

    let response = Response::from(engine.package_versions("doesnotexist"));
    assert_eq!(response.status_code, StatusCode::NotFound);
    assert!(response.message.is_some());
}

#[test]
fn test_invalid_query_id_bad_request() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());

    let response = Response::from(engine.package_versions("foo/bar"));
    assert_eq!(response.status_code, StatusCode::BadRequest);
}

#[test]
fn test_archive_without_root_manifest_is_corrupt() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());
    let nuspec = manifest("Foo", "1.0.0");
    let bytes = archive(&[("content/Foo.nuspec", nuspec.as_bytes())]);

    let err = engine.push("foo.nupkg", &bytes).unwrap_err();
    assert!(matches!(err, FeedError::CorruptArchive(_)));
    assert_eq!(err.status(), StatusCode::BadRequest);
}

#[test]
fn test_two_root_manifests_are_ambiguous() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());
    let a = manifest("Foo", "1.0.0");
    let b = manifest("Bar", "1.0.0");
    let bytes = archive(&[("Foo.nuspec", a.as_bytes()), ("Bar.nuspec", b.as_bytes())]);

    let err = engine.push("foo.nupkg", &bytes).unwrap_err();
    assert!(matches!(err, FeedError::AmbiguousManifest { .. }));
}

#[test]
fn test_empty_id_is_invalid_manifest() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());
    let nuspec = manifest("", "1.0.0");
    let bytes = archive(&[("package.nuspec", nuspec.as_bytes())]);

    let err = engine.push("foo.nupkg", &bytes).unwrap_err();
    assert!(matches!(err, FeedError::InvalidManifest(_)));
}

#[test]
fn test_unparsable_version_is_invalid_manifest() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());

    let err = engine
        .push("foo.nupkg", &nupkg("Foo", "one.two"))
        .unwrap_err();
    assert!(matches!(err, FeedError::InvalidManifest(_)));
}

#[test]
fn test_rejected_pushes_leave_nothing_behind() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(temp.path());

    let _ = engine.push("x.nupkg", b"garbage");
    let _ = engine.push("y.nupkg", &nupkg("", "1.0.0"));

    assert!(engine.search(None).unwrap().is_empty());
    assert!(archives_on_disk(temp.path()).is_empty());
}

// ============================================================================
// Index and Disk Agreement
// ============================================================================

#[test]
fn test_index_matches_disk_across_reopen() {
    let temp = TempDir::new().unwrap();
    {
        let engine = open_engine(temp.path());
        engine.push("a.nupkg", &nupkg("Foo", "1.0.0")).unwrap();
        engine.push("b.nupkg", &nupkg("Foo", "1.1.0-rc.1")).unwrap();
        engine.push("c.nupkg", &nupkg("NUnit", "3.14.0")).unwrap();
        let _ = engine.push("d.nupkg", &nupkg("Foo", "1.0.0"));
        let _ = engine.push("e.nupkg", b"not a zip");

        assert_eq!(indexed(&engine), archives_on_disk(temp.path()));
    }

    let reopened = open_engine(temp.path());
    let expected: BTreeSet<String> = ["foo/1.0.0", "foo/1.1.0-rc.1", "nunit/3.14.0"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(indexed(&reopened), expected);
    assert_eq!(archives_on_disk(temp.path()), expected);
    assert_eq!(versions(&reopened, "foo"), vec!["1.1.0-rc.1", "1.0.0"]);
}

#[test]
fn test_second_feed_on_same_root_is_refused() {
    let temp = TempDir::new().unwrap();
    let serving = open_engine(temp.path());

    let err = FeedStore::open(StoreConfig::new(temp.path())).unwrap_err();
    assert!(matches!(err, StoreError::Locked { .. }));
    let mapped = FeedError::from(err);
    assert!(matches!(mapped, FeedError::StoreIoFailure(_)));

    // The running feed still owns every write and sees every push.
    serving.push("a.nupkg", &nupkg("Foo", "1.0.0")).unwrap();
    assert!(matches!(
        serving.push("b.nupkg", &nupkg("Foo", "1.0.0")),
        Err(FeedError::VersionConflict { .. })
    ));
    assert_eq!(indexed(&serving), archives_on_disk(temp.path()));

    drop(serving);
    let reopened = open_engine(temp.path());
    assert_eq!(versions(&reopened, "Foo"), vec!["1.0.0"]);
}

#[test]
fn test_interleaved_reads_never_see_partial_entries() {
    let temp = TempDir::new().unwrap();
    let engine = Arc::new(open_engine(temp.path()));

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for patch in 0..20 {
                engine
                    .push("upload.nupkg", &nupkg("Foo", &format!("1.0.{}", patch)))
                    .unwrap();
            }
        })
    };

    // Every indexed entry must have a readable archive at every observation.
    while !writer.is_finished() {
        let _ = indexed(&engine);
    }
    writer.join().unwrap();

    assert_eq!(indexed(&engine).len(), 20);
    assert_eq!(indexed(&engine), archives_on_disk(temp.path()));
}

//! LocalFeed - a local package feed
//!
//! This library accepts uploaded package archives, extracts their identity
//! from the embedded manifest, stores them under a stable on-disk layout keyed
//! by package id and version, and answers search and version listing queries.
//!
//! # Layers
//!
//! - [`package`]: identity types, archive reader, manifest parser and version
//!   ordering
//! - [`feed`]: the durable feed store and its in-memory index
//! - [`engine`]: the [`PackageService`](engine::PackageService) operations
//!   (push, search, list versions) and the result envelope
//! - [`config`] and [`logging`]: ambient configuration and tracing setup
//!
//! # Example
//!
//! ```ignore
//! use localfeed::engine::{FeedEngine, PackageService};
//! use localfeed::feed::{FeedStore, StoreConfig};
//!
//! let store = FeedStore::open(StoreConfig::new("/var/lib/localfeed"))?;
//! let engine = FeedEngine::new(store);
//!
//! let stored = engine.push("Foo.1.0.0.nupkg", &bytes)?;
//! println!("stored {} at {}", stored.identity, stored.archive_path().display());
//!
//! let versions = engine.package_versions("foo")?;
//! ```

pub mod config;
pub mod engine;
pub mod feed;
pub mod logging;
pub mod package;

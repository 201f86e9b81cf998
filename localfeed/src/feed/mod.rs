//! Durable package storage and the queryable feed index.
//!
//! # Overview
//!
//! ```text
//! put(identity, archive, manifest)
//!        │
//!        ▼
//! ┌──────────────┐   rename under   ┌──────────────────┐
//! │  .staging/   │ ───────────────► │ <id>/<version>/  │
//! │  push-XXXX/  │   index lock     │  archive         │
//! └──────────────┘                  │  manifest        │
//!                                   │  metadata.json   │
//!                                   └────────┬─────────┘
//!                                            │ insert
//!                                            ▼
//!                                   ┌──────────────────┐
//!                                   │    FeedIndex     │ ◄── search / list
//!                                   └──────────────────┘
//! ```
//!
//! The index is rebuilt from the metadata snapshots every time the store is
//! opened, so the directory tree is the only source of truth. One process at
//! a time may have a feed open; it holds an exclusive lock on `<root>/.lock`.

mod config;
mod error;
mod index;
mod layout;
mod policy;
mod snapshot;
mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use index::FeedIndex;
pub use layout::{
    FeedLayout, ARCHIVE_EXTENSION, LOCK_FILENAME, QUARANTINE_DIR, SNAPSHOT_FILENAME, STAGING_DIR,
};
pub use policy::RetryPolicy;
pub use snapshot::calculate_sha256;
pub use store::FeedStore;

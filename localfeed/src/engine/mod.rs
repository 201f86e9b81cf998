//! Package ingestion and query engine.
//!
//! # Overview
//!
//! - [`PackageService`]: the operations callers depend on
//! - [`FeedEngine`]: the production implementation over a [`FeedStore`]
//! - [`FeedError`] and [`Response`]: typed failures and the uniform
//!   status-plus-data envelope callers map onto their transport
//!
//! [`FeedStore`]: crate::feed::FeedStore

mod error;
mod response;
mod service;
mod traits;

pub use error::{FeedError, FeedResult};
pub use response::{Response, StatusCode};
pub use service::{FeedEngine, PushStage};
pub use traits::PackageService;

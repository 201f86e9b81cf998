//! CLI command implementations.

pub mod config;
pub mod push;
pub mod search;
pub mod serve;
pub mod versions;

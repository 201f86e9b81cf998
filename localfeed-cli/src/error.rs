//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;

use localfeed::config::ConfigError;
use localfeed::engine::FeedError;
use localfeed::feed::StoreError;
use localfeed::logging::LoggingError;

/// Errors surfaced by CLI commands.
///
/// Printed as `Error: <message>` by `main`, which then exits with status 1.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("failed to initialise logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("failed to open feed: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

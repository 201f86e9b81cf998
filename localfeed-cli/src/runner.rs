//! Shared setup for CLI commands.

use std::path::PathBuf;

use tracing::info;

use localfeed::config::ConfigFile;
use localfeed::engine::FeedEngine;
use localfeed::feed::FeedStore;
use localfeed::logging::{init_logging, LoggingGuard};

use crate::error::CliError;

/// Loads configuration and installs logging once per invocation.
pub struct CliRunner {
    config: ConfigFile,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load `config.ini` and start logging.
    pub fn new() -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let logging = init_logging(&config.logging_config())?;
        Ok(Self {
            config,
            _logging: logging,
        })
    }

    /// Loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log the command being run.
    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = env!("CARGO_PKG_VERSION"),
            root = %self.config.feed.root_dir.display(),
            "localfeed starting"
        );
    }

    /// Open the feed at `root`, or at the configured root when `None`.
    pub fn open_engine(&self, root: Option<PathBuf>) -> Result<FeedEngine, CliError> {
        let mut store_config = self.config.store_config();
        if let Some(root) = root {
            store_config.root_dir = root;
        }
        let store = FeedStore::open(store_config)?;
        Ok(FeedEngine::new(store))
    }
}

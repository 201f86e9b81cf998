//! Tracing subscriber setup.
//!
//! Logs always go to stderr. When a log directory is configured they are
//! also written, without colour and with local RFC 3339 timestamps, to
//! `<directory>/localfeed.log` through a non-blocking writer.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the configured
//! level (e.g. `info` or `localfeed=debug,tower_http=warn`).

use std::path::PathBuf;

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "localfeed.log";

/// Errors installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for the log file; `None` disables file logging.
    pub directory: Option<PathBuf>,
    /// Log file name inside `directory`.
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LoggingConfig {
    /// Stderr-only logging at `level`.
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            directory: None,
            file_name: DEFAULT_LOG_FILE.to_string(),
        }
    }

    /// Also write logs into `directory`.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Full path of the log file, if file logging is enabled.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.directory.as_ref().map(|dir| dir.join(&self.file_name))
    }
}

/// Keeps the file writer flushing; hold it until the process exits.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if the filter does not parse, the log directory cannot be created,
/// or a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = build_filter(config)?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, file_guard) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory).map_err(|e| LoggingError::CreateDirectory {
                path: directory.clone(),
                source: e,
            })?;

            let appender = tracing_appender::rolling::never(directory, &config.file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            // The local offset is unavailable in some multi-threaded contexts.
            let timer = OffsetTime::local_rfc_3339()
                .unwrap_or_else(|_| OffsetTime::new(UtcOffset::UTC, Rfc3339));

            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(timer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(LoggingGuard { _file: file_guard })
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| LoggingError::InvalidFilter {
        filter: config.level.clone(),
        reason: e.to_string(),
    })
}

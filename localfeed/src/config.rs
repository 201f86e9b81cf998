//! Configuration file for the feed.
//!
//! Settings live in an INI file at `<config_dir>/localfeed/config.ini`
//! (`~/.config/localfeed/config.ini` on Linux):
//!
//! ```ini
//! [feed]
//! root_dir = /home/me/.local/share/localfeed/packages
//! store_retries = 3
//!
//! [server]
//! bind = 127.0.0.1:5000
//!
//! [logging]
//! level = info
//! directory = /home/me/.local/state/localfeed
//! ```
//!
//! A missing file or key falls back to its default.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::feed::{RetryPolicy, StoreConfig};
use crate::logging::LoggingConfig;

/// Application directory name under the platform config and data dirs.
pub const APP_DIR: &str = "localfeed";

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.ini";

/// Default HTTP bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Default number of attempts for store writes.
pub const DEFAULT_STORE_RETRIES: u32 = 3;

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors reading, validating or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// `[feed]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    /// Feed root directory.
    pub root_dir: PathBuf,
    /// Attempts for store writes, including the first.
    pub store_retries: u32,
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    /// HTTP bind address.
    pub bind: SocketAddr,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Default log filter, overridden by `RUST_LOG`.
    pub level: String,
    /// Directory for the log file; file logging is off when unset.
    pub directory: Option<PathBuf>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub feed: FeedSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            feed: FeedSettings {
                root_dir: default_root_dir(),
                store_retries: DEFAULT_STORE_RETRIES,
            },
            server: ServerSettings {
                bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            },
            logging: LoggingSettings {
                level: DEFAULT_LOG_LEVEL.to_string(),
                directory: None,
            },
        }
    }
}

impl ConfigFile {
    /// Load from the default location, or defaults if the file is absent.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, or defaults if the file is absent.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let write_failed = |e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini.write_to_file(path).map_err(write_failed)
    }

    /// Store configuration derived from the `[feed]` section.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.feed.root_dir.clone())
            .with_retry_policy(RetryPolicy::exponential(self.feed.store_retries))
    }

    /// Logging configuration derived from the `[logging]` section.
    pub fn logging_config(&self) -> LoggingConfig {
        let mut logging = LoggingConfig::new(self.logging.level.clone());
        if let Some(directory) = &self.logging.directory {
            logging = logging.with_directory(directory.clone());
        }
        logging
    }
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILENAME)
}

/// Default feed root: `<data_dir>/localfeed/packages`.
pub fn default_root_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("packages")
}

/// A settable configuration key, named `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    FeedRootDir,
    FeedStoreRetries,
    ServerBind,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::FeedRootDir,
            ConfigKey::FeedStoreRetries,
            ConfigKey::ServerBind,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingDirectory,
        ]
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::FeedRootDir | ConfigKey::FeedStoreRetries => "feed",
            ConfigKey::ServerBind => "server",
            ConfigKey::LoggingLevel | ConfigKey::LoggingDirectory => "logging",
        }
    }

    /// Key within its section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::FeedRootDir => "root_dir",
            ConfigKey::FeedStoreRetries => "store_retries",
            ConfigKey::ServerBind => "bind",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::FeedRootDir => config.feed.root_dir.display().to_string(),
            ConfigKey::FeedStoreRetries => config.feed.store_retries.to_string(),
            ConfigKey::ServerBind => config.server.bind.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate and store `value`.
    ///
    /// An empty value clears `logging.directory`; other keys require one.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> ConfigResult<()> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match self {
            ConfigKey::FeedRootDir => {
                if value.is_empty() {
                    return Err(invalid("a directory is required"));
                }
                config.feed.root_dir = expand_home(value);
            }
            ConfigKey::FeedStoreRetries => {
                let retries: u32 = value
                    .parse()
                    .map_err(|_| invalid("expected a positive integer"))?;
                if retries == 0 {
                    return Err(invalid("at least one attempt is required"));
                }
                config.feed.store_retries = retries;
            }
            ConfigKey::ServerBind => {
                config.server.bind = value
                    .parse()
                    .map_err(|_| invalid("expected host:port, e.g. 127.0.0.1:5000"))?;
            }
            ConfigKey::LoggingLevel => {
                if value.is_empty() {
                    return Err(invalid("a log filter is required"));
                }
                config.logging.level = value.to_string();
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = (!value.is_empty()).then(|| expand_home(value));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn expand_home(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(value)),
        None => PathBuf::from(value),
    }
}

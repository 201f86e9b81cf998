//! Configuration for the feed store.

use std::path::PathBuf;

use super::policy::RetryPolicy;

/// Configuration for the feed store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the feed.
    pub root_dir: PathBuf,

    /// Retry policy for transient write failures.
    pub retry: RetryPolicy,
}

impl StoreConfig {
    /// Create a configuration rooted at `root_dir` with the default retry policy.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

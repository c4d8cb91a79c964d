//! Transport configuration.
//!
//! Loaded from TOML with serde defaults for every field, so an empty
//! document yields a usable configuration:
//!
//! ```toml
//! queue = "orders"
//! workers = 4
//! poll_interval_ms = 50
//! ```

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a [`TransportConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML or has fields of the wrong type.
    #[error("invalid transport config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The document parsed but describes an unusable transport.
    #[error("invalid transport config: {0}")]
    Invalid(String),
}

/// Settings for [`transport::listen`](crate::transport::listen).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Named queue the workers pull from.
    pub queue: String,
    /// Number of worker threads, each dispatching one message at a time.
    pub workers: usize,
    /// How long one `listen` call blocks before the worker re-checks for stop.
    pub poll_interval_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            queue: "messages".to_string(),
            workers: 4,
            poll_interval_ms: 50,
        }
    }
}

impl TransportConfig {
    /// Configuration for `queue` with default worker settings.
    pub fn for_queue(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            ..Self::default()
        }
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no transport can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.trim().is_empty() {
            return Err(ConfigError::Invalid("queue name must not be empty".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

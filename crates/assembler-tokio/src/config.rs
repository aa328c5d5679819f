//! Worker pool configuration
//!
//! Configuration for the tokio runtime whose blocking pool runs lookups
//! dispatched by [`FutureAdapter`](crate::FutureAdapter) and
//! [`BlockingScheduler`](crate::BlockingScheduler).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while configuring or starting a [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Error)]
pub enum PoolError {
    /// A configuration value is out of range
    #[error("invalid worker pool configuration: {reason}")]
    InvalidConfig {
        /// Offending key and constraint
        reason: String,
    },

    /// The TOML document could not be parsed
    #[error("failed to parse worker pool configuration")]
    Parse(#[from] toml::de::Error),

    /// The runtime could not be started
    #[error("failed to start worker pool")]
    Build(#[source] std::io::Error),
}

impl PoolError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Async worker threads; `None` uses tokio's default (one per core)
    pub worker_threads: Option<usize>,

    /// Upper bound on threads running lookups concurrently
    pub max_blocking_threads: usize,

    /// Name given to every pool thread
    pub thread_name: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            max_blocking_threads: 512,
            thread_name: "assembler-worker".to_string(),
        }
    }
}

impl WorkerPoolConfig {
    /// Parse and validate a TOML document; absent keys take their defaults.
    pub fn from_toml_str(document: &str) -> Result<Self, PoolError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime builder cannot honour.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.worker_threads == Some(0) {
            return Err(PoolError::invalid("worker_threads must be at least 1"));
        }
        if self.max_blocking_threads == 0 {
            return Err(PoolError::invalid("max_blocking_threads must be at least 1"));
        }
        if self.thread_name.trim().is_empty() {
            return Err(PoolError::invalid("thread_name must not be empty"));
        }
        Ok(())
    }
}

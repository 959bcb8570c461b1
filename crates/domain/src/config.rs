//! Engine configuration structures
//!
//! All sections are optional in configuration files; missing fields fall back
//! to the defaults below.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_EXPIRATION_TIME_SECS;

/// Top-level configuration for the token engine and its adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub tokens: TokenConfig,
    pub logging: LoggingConfig,
}

/// Transport timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub user_agent: Option<String>,
}

impl HttpConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { connect_timeout_ms: 30_000, read_timeout_ms: 30_000, user_agent: None }
    }
}

/// Timeout retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Fixed delay before the single timeout retry.
    pub timeout_retry_delay_ms: u64,
}

impl RetryConfig {
    #[must_use]
    pub fn timeout_retry_delay(&self) -> Duration {
        Duration::from_millis(self.timeout_retry_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { timeout_retry_delay_ms: 1_000 }
    }
}

/// Token expiry defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Lifetime applied when the server omits `expires_in` or sends garbage.
    pub default_expiration_secs: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self { default_expiration_secs: DEFAULT_EXPIRATION_TIME_SECS }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "info".to_string(), json: false }
    }
}

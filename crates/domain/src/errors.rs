//! Error types for domain-level parsing and configuration

use std::time::Duration;

use oidcflow_common::{ErrorClassification, ErrorSeverity};
use thiserror::Error;

/// Failure to read the claims out of a raw ID token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdTokenError {
    #[error("ID token is blank")]
    Blank,

    #[error("ID token has {0} segment(s), expected at least 2")]
    Segments(usize),

    #[error("ID token payload is not base64url: {0}")]
    Encoding(String),

    #[error("ID token payload is not a JSON object: {0}")]
    Json(String),
}

impl ErrorClassification for IdTokenError {
    fn is_retryable(&self) -> bool {
        false
    }

    // A malformed ID token leaves the exchange successful, only without
    // user info.
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Invalid or unreadable engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for configuration loading
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl ErrorClassification for ConfigError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_token_failures_are_warnings() {
        assert_eq!(IdTokenError::Segments(1).severity(), ErrorSeverity::Warning);
        assert!(!IdTokenError::Blank.is_retryable());
    }

    #[test]
    fn config_failures_are_errors() {
        let io = ConfigError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        for err in [ConfigError::Invalid("zero timeout".into()), ConfigError::NotFound("x".into()), io] {
            assert_eq!(err.severity(), ErrorSeverity::Error);
            assert!(!err.is_retryable());
            assert!(!err.is_critical());
            assert_eq!(err.retry_after(), None);
        }
    }
}

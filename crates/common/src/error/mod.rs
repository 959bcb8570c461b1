//! Error classification shared by every oidcflow error type
//!
//! Errors across the workspace are plain `thiserror` enums owned by the crate
//! that produces them. What they share is this module's
//! [`ErrorClassification`] trait, which lets callers make uniform decisions:
//!
//! - **`is_retryable()`**: may the same request succeed if sent again?
//! - **`severity()`**: how loudly should this be logged or alerted on?
//! - **`is_critical()`**: does this indicate an integrity problem (for example
//!   a CSRF state mismatch) rather than an ordinary failure?
//! - **`retry_after()`**: suggested delay before the next attempt, if any.
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | Unrecognized but harmless responses |
//! | **Warning** | Degraded but recoverable | Transient 5xx, timeouts |
//! | **Error** | Failure requiring attention | Server errors, malformed input |
//! | **Critical** | Authentication integrity at risk | Missing or forged state |
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use oidcflow_common::error::{ErrorClassification, ErrorSeverity};
//!
//! #[derive(Debug)]
//! enum FetchError {
//!     Busy,
//!     Denied,
//! }
//!
//! impl ErrorClassification for FetchError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         match self {
//!             Self::Busy => ErrorSeverity::Warning,
//!             Self::Denied => ErrorSeverity::Error,
//!         }
//!     }
//!
//!     fn is_critical(&self) -> bool {
//!         false
//!     }
//!
//!     fn retry_after(&self) -> Option<Duration> {
//!         None
//!     }
//! }
//!
//! assert!(FetchError::Busy.is_retryable());
//! assert_eq!(FetchError::Denied.severity(), ErrorSeverity::Error);
//! ```

use std::fmt;
use std::time::Duration;

/// Standard interface for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if attempted
    /// again, such as network timeouts or temporary service unavailability.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for monitoring, alerting, and logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

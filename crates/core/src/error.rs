//! Engine error taxonomy
//!
//! Server-side OAuth errors are not represented here: they are returned as
//! [`oidcflow_domain::TokenResult::ProtocolError`] data. `AuthError` covers
//! the cases where no well-formed result could be produced at all.

use oidcflow_common::{ErrorClassification, ErrorSeverity};
use thiserror::Error;

/// Result alias for engine operations.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Failures surfaced by the token exchange engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The authorization redirect carried no `state` parameter.
    #[error("authorization response is missing the state parameter")]
    NoState,

    /// The `state` parameter did not decode or belongs to another request.
    #[error("authorization response state is malformed or does not match this request")]
    BadState,

    /// A required authorization request field could not be encoded.
    #[error("cannot encode required request field '{field}'")]
    EncodingUnsupported { field: &'static str },

    /// The device certificate challenge was malformed or could not be signed.
    #[error("device certificate challenge is invalid: {0}")]
    DeviceCertificateRequestInvalid(String),

    /// Transient failure surfaced as retryable (extended token lifetime).
    #[error("server temporarily unavailable{}: {message}", status_suffix(.status))]
    ServerRetryable { status: Option<u16>, message: String },

    /// Hard server failure: empty body, non-JSON body, unexpected status,
    /// or an exhausted transient retry.
    #[error("server error{}: {body}", status_suffix(.status))]
    ServerError { status: Option<u16>, body: String },

    /// A well-formed body of none of the recognized shapes.
    #[error("unrecognized token response{}", status_suffix(.status))]
    UnrecognizedResponse { status: Option<u16>, body: String },

    /// Caller supplied an unusable input.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Non-timeout transport I/O failure.
    #[error("network failure: {0}")]
    Network(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

impl ErrorClassification for AuthError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerRetryable { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoState | Self::BadState => ErrorSeverity::Critical,
            Self::ServerRetryable { .. } | Self::Network(_) => ErrorSeverity::Warning,
            Self::EncodingUnsupported { .. }
            | Self::DeviceCertificateRequestInvalid(_)
            | Self::ServerError { .. }
            | Self::UnrecognizedResponse { .. }
            | Self::InvalidRequest(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::NoState | Self::BadState)
    }

    fn retry_after(&self) -> Option<std::time::Duration> {
        None
    }
}

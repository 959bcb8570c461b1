//! Web transport port - synchronous HTTP POST to the token endpoint
//!
//! The engine only distinguishes two transport failures: a timeout, which is
//! eligible for the single retry, and any other I/O failure, which is fatal.

use std::collections::BTreeMap;
use std::time::Duration;

use oidcflow_common::{ErrorClassification, ErrorSeverity};
use thiserror::Error;
use uuid::Uuid;

/// One outgoing POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRequest {
    pub url: String,
    /// Request headers; `Content-Type` is carried separately.
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub content_type: String,
    /// Correlation id the transport should attach to this call.
    pub correlation_id: Uuid,
}

impl PostRequest {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status, body, and headers of a completed POST.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub headers: BTreeMap<String, Vec<String>>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into(), headers: BTreeMap::new() }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}

/// Transport failure channels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport I/O failure: {0}")]
    Io(String),
}

impl ErrorClassification for TransportError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Timeout(_) => ErrorSeverity::Warning,
            Self::Io(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Port trait for the blocking HTTP collaborator
///
/// Implementations apply their own connect/read timeouts and report them as
/// [`TransportError::Timeout`].
pub trait WebTransport: Send + Sync {
    /// Send `request` and wait for the complete response.
    fn send_post(&self, request: &PostRequest) -> Result<HttpResponse, TransportError>;
}

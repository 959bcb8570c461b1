//! Telemetry sink port - timing events around each token POST
//!
//! Sinks are process-wide and may be shared by many engines at once, so
//! implementations must accept concurrent writes keyed by request id without
//! caller-side locking. Sink failures never change an exchange outcome.

use std::time::Duration;

use oidcflow_common::{ErrorClassification, ErrorSeverity};
use thiserror::Error;
use uuid::Uuid;

/// One bracketed HTTP call, as reported to the sink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpEvent {
    /// Event name (e.g. "http_event")
    pub name: String,
    /// Telemetry request id the event is keyed by
    pub request_id: String,
    pub method: String,
    /// Request URL without query
    pub path: String,
    /// HTTP status, absent when the call timed out or failed
    pub response_code: Option<u16>,
    pub correlation_id: Option<Uuid>,
    /// OAuth `error` of a protocol error response
    pub oauth_error_code: Option<String>,
    /// Server `x-ms-request-id` header
    pub server_request_id: Option<String>,
    /// 1 for the first POST, 2 for the timeout retry
    pub attempt: u32,
    /// Set for the device-challenge response POST
    pub nested: bool,
}

/// Telemetry sink failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("telemetry sink failure: {0}")]
pub struct TelemetryError(pub String);

impl ErrorClassification for TelemetryError {
    fn is_retryable(&self) -> bool {
        false
    }

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

/// Port trait for telemetry collection
pub trait TelemetrySink: Send + Sync {
    /// Mark the start of `event_name` for `request_id`.
    fn start_event(&self, request_id: &str, event_name: &str) -> Result<(), TelemetryError>;

    /// Finish an event started with [`Self::start_event`].
    fn stop_event(&self, request_id: &str, event: &HttpEvent) -> Result<(), TelemetryError>;

    /// Record the server error codes of the latest response for
    /// `correlation_id`; `None` clears them.
    fn record_last_error_codes(
        &self,
        correlation_id: Uuid,
        error_codes: Option<&[String]>,
    ) -> Result<(), TelemetryError>;
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn start_event(&self, _request_id: &str, _event_name: &str) -> Result<(), TelemetryError> {
        Ok(())
    }

    fn stop_event(&self, _request_id: &str, _event: &HttpEvent) -> Result<(), TelemetryError> {
        Ok(())
    }

    fn record_last_error_codes(
        &self,
        _correlation_id: Uuid,
        _error_codes: Option<&[String]>,
    ) -> Result<(), TelemetryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_failures_are_warnings_only() {
        let err = TelemetryError("no open event".into());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(!err.is_retryable());
        assert!(!err.is_critical());
    }
}

//! `tracing`-backed telemetry sink
//!
//! Events are keyed by telemetry request id in concurrent maps, so one sink
//! can be shared by every engine in the process.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use oidcflow_core::{HttpEvent, TelemetryError, TelemetrySink};
use uuid::Uuid;

/// A stopped event and how long it was open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedEvent {
    pub event: HttpEvent,
    pub elapsed: Duration,
}

#[derive(Debug)]
struct OpenEvent {
    name: String,
    started: Instant,
}

/// [`TelemetrySink`] that logs every event and keeps them for inspection.
#[derive(Debug, Default)]
pub struct TracingTelemetrySink {
    open: DashMap<String, Vec<OpenEvent>>,
    completed: DashMap<String, Vec<CompletedEvent>>,
    last_error_codes: DashMap<Uuid, Vec<String>>,
}

impl TracingTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed events for `request_id`, oldest first.
    pub fn events(&self, request_id: &str) -> Vec<CompletedEvent> {
        self.completed.get(request_id).map(|events| events.clone()).unwrap_or_default()
    }

    /// Remove and return the completed events for `request_id`.
    pub fn take_events(&self, request_id: &str) -> Vec<CompletedEvent> {
        self.completed.remove(request_id).map(|(_, events)| events).unwrap_or_default()
    }

    pub fn last_error_codes(&self, correlation_id: Uuid) -> Option<Vec<String>> {
        self.last_error_codes.get(&correlation_id).map(|codes| codes.clone())
    }

    /// Number of events started but not yet stopped.
    pub fn open_event_count(&self) -> usize {
        self.open.iter().map(|entry| entry.value().len()).sum()
    }
}

impl TelemetrySink for TracingTelemetrySink {
    fn start_event(&self, request_id: &str, event_name: &str) -> Result<(), TelemetryError> {
        if request_id.trim().is_empty() {
            return Err(TelemetryError("event started without a request id".into()));
        }

        tracing::trace!(request_id, event = event_name, "telemetry event started");
        self.open
            .entry(request_id.to_string())
            .or_default()
            .push(OpenEvent { name: event_name.to_string(), started: Instant::now() });
        Ok(())
    }

    fn stop_event(&self, request_id: &str, event: &HttpEvent) -> Result<(), TelemetryError> {
        let started = {
            let mut open = self.open.get_mut(request_id).ok_or_else(|| {
                TelemetryError(format!("no open event for request id {request_id}"))
            })?;
            let position =
                open.iter().rposition(|candidate| candidate.name == event.name).ok_or_else(|| {
                    TelemetryError(format!("event {} was never started", event.name))
                })?;
            open.remove(position).started
        };
        self.open.remove_if(request_id, |_, events| events.is_empty());

        let elapsed = started.elapsed();
        let correlation_id = event.correlation_id.map(|id| id.to_string());
        tracing::info!(
            request_id,
            event = %event.name,
            method = %event.method,
            endpoint = %event.path,
            status = event.response_code,
            correlation_id = correlation_id.as_deref(),
            oauth_error = event.oauth_error_code.as_deref(),
            server_request_id = event.server_request_id.as_deref(),
            attempt = event.attempt,
            nested = event.nested,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "telemetry event"
        );

        self.completed
            .entry(request_id.to_string())
            .or_default()
            .push(CompletedEvent { event: event.clone(), elapsed });
        Ok(())
    }

    fn record_last_error_codes(
        &self,
        correlation_id: Uuid,
        error_codes: Option<&[String]>,
    ) -> Result<(), TelemetryError> {
        match error_codes {
            Some(codes) => {
                tracing::debug!(%correlation_id, codes = ?codes, "recorded server error codes");
                self.last_error_codes.insert(correlation_id, codes.to_vec());
            }
            None => {
                self.last_error_codes.remove(&correlation_id);
            }
        }
        Ok(())
    }
}

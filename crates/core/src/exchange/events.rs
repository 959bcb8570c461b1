//! Telemetry event bracketing for token POSTs

use tracing::warn;

use crate::telemetry_ports::{HttpEvent, TelemetryError, TelemetrySink};

/// Keeps at most one event open and stops it when replaced or dropped.
pub(crate) struct EventScope<'a> {
    sink: &'a dyn TelemetrySink,
    open: Option<HttpEvent>,
}

impl<'a> EventScope<'a> {
    pub(crate) fn new(sink: &'a dyn TelemetrySink) -> Self {
        Self { sink, open: None }
    }

    /// Stop the open event, if any, and start `event`.
    pub(crate) fn begin(&mut self, event: HttpEvent) {
        self.finish();
        report(self.sink.start_event(&event.request_id, &event.name));
        self.open = Some(event);
    }

    pub(crate) fn current(&mut self) -> Option<&mut HttpEvent> {
        self.open.as_mut()
    }

    pub(crate) fn finish(&mut self) {
        if let Some(event) = self.open.take() {
            report(self.sink.stop_event(&event.request_id, &event));
        }
    }
}

impl Drop for EventScope<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Log and drop a sink failure.
pub(crate) fn report(result: Result<(), TelemetryError>) {
    if let Err(err) = result {
        warn!(error = %err, "telemetry sink failed; continuing");
    }
}

//! Observability infrastructure for logging and telemetry
//!
//! - [`logging::init`] installs the process-wide `tracing` subscriber.
//! - [`TracingTelemetrySink`] implements the engine's telemetry port on top
//!   of `tracing`, keeping completed events in concurrent maps.
//!
//! Telemetry failures are reported back to the engine as
//! `TelemetryError`, which logs them and carries on.

pub mod logging;
pub mod telemetry;

pub use telemetry::{CompletedEvent, TracingTelemetrySink};

//! # oidcflow Infrastructure
//!
//! Infrastructure implementations of the engine's ports.
//!
//! This crate contains:
//! - Blocking HTTP transport (`reqwest`)
//! - RS256 device certificate signer for PKeyAuth (`jsonwebtoken`)
//! - `tracing`-backed telemetry sink and logging initialisation
//! - Configuration loading from environment and files
//!
//! ## Architecture
//! - Implements traits defined in `oidcflow-core`
//! - Depends on `oidcflow-domain` and `oidcflow-core`
//! - Contains all "impure" code (network, filesystem, global subscriber)

pub mod config;
pub mod factory;
pub mod http;
pub mod observability;
pub mod signing;

// Re-export commonly used items
pub use factory::EngineFactory;
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use observability::{CompletedEvent, TracingTelemetrySink};
pub use signing::{DeviceAssertionClaims, DeviceCertificateSigner};

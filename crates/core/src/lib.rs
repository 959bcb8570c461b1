//! # oidcflow Core
//!
//! OAuth2/OIDC token acquisition logic - no network code.
//!
//! This crate contains:
//! - The per-attempt [`RequestContext`] with its memoized PKCE pair
//! - Protocol message construction (endpoints, authorization query, CSRF state)
//! - Response classification into [`oidcflow_domain::TokenResult`]
//! - The [`TokenExchangeEngine`] with its timeout retry and device challenge policies
//! - Port interfaces (traits) for transport, telemetry and signing
//!
//! ## Architecture Principles
//! - Depends only on `oidcflow-common` and `oidcflow-domain`
//! - All I/O goes through the port traits
//! - Blocking by design: callers run the engine off latency-sensitive threads

pub mod challenge;
pub mod error;
pub mod exchange;
pub mod protocol;
pub mod request;
pub mod response;

// Infrastructure ports
pub mod signing_ports;
pub mod telemetry_ports;
pub mod transport_ports;

pub use challenge::{ChallengeResponder, ChallengeResponse, DeviceChallenge};
pub use error::{AuthError, AuthResult};
pub use exchange::{EngineState, ExchangeSettings, TokenExchangeEngine};
pub use protocol::{ProtocolState, ProtocolUrlBuilder};
pub use request::{RequestContext, RequestContextBuilder};
pub use response::{ClassifyContext, ResponseClassifier};
pub use signing_ports::{JwsSigner, SigningError};
pub use telemetry_ports::{HttpEvent, NoopTelemetry, TelemetryError, TelemetrySink};
pub use transport_ports::{HttpResponse, PostRequest, TransportError, WebTransport};

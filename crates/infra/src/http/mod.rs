//! HTTP transport for token endpoint POSTs

mod client;

pub use client::{ReqwestTransport, ReqwestTransportBuilder};

//! Production wiring of engines

use std::sync::Arc;

use oidcflow_core::{
    ExchangeSettings, JwsSigner, RequestContext, TokenExchangeEngine, TransportError,
};
use oidcflow_domain::EngineConfig;

use crate::http::ReqwestTransport;
use crate::observability::TracingTelemetrySink;

/// Builds engines that share one transport and one telemetry sink.
///
/// Create it once per process; [`EngineFactory::engine`] is cheap.
#[derive(Clone)]
pub struct EngineFactory {
    transport: Arc<ReqwestTransport>,
    telemetry: Arc<TracingTelemetrySink>,
    signer: Option<Arc<dyn JwsSigner>>,
    settings: ExchangeSettings,
}

impl EngineFactory {
    /// # Errors
    /// Fails when the HTTP client cannot be built.
    pub fn from_config(config: &EngineConfig) -> Result<Self, TransportError> {
        Ok(Self {
            transport: Arc::new(ReqwestTransport::from_config(&config.http)?),
            telemetry: Arc::new(TracingTelemetrySink::new()),
            signer: None,
            settings: ExchangeSettings::from(config),
        })
    }

    /// Answer device challenges with `signer`.
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn JwsSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ExchangeSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn telemetry(&self) -> &Arc<TracingTelemetrySink> {
        &self.telemetry
    }

    /// A fresh engine bound to `context`.
    pub fn engine(&self, context: RequestContext) -> TokenExchangeEngine {
        let engine = TokenExchangeEngine::new(context, self.transport.clone())
            .with_telemetry(self.telemetry.clone())
            .with_settings(self.settings);
        match &self.signer {
            Some(signer) => engine.with_signer(Arc::clone(signer)),
            None => engine,
        }
    }
}

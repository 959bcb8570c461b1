//! Shared test helpers for `oidcflow-core` integration tests.
//!
//! Scripted fakes for the engine's ports so flow tests can focus on
//! behaviour instead of boilerplate.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use oidcflow_core::{
    DeviceChallenge, ExchangeSettings, HttpEvent, HttpResponse, JwsSigner, PostRequest,
    ProtocolState, RequestContext, SigningError, TelemetryError, TelemetrySink,
    TokenExchangeEngine, TransportError, WebTransport,
};
use url::form_urlencoded;
use uuid::Uuid;

pub const AUTHORITY: &str = "https://login.example.com/common";
pub const RESOURCE: &str = "https://graph.example.com";
pub const CLIENT_ID: &str = "client-1";
pub const REDIRECT_URI: &str = "https://app.example.com/callback";
pub const TOKEN_ENDPOINT: &str = "https://login.example.com/common/connect/token";

/// One scripted transport reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(HttpResponse),
    Timeout,
    Io(&'static str),
}

impl Reply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::Respond(HttpResponse::new(status, body.to_string()))
    }
}

/// Transport that replays a fixed script and records every request.
#[derive(Default, Clone)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<PostRequest>>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<PostRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl WebTransport for ScriptedTransport {
    fn send_post(&self, request: &PostRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Timeout) => Err(TransportError::Timeout("read timed out".into())),
            Some(Reply::Io(message)) => Err(TransportError::Io(message.into())),
            None => Err(TransportError::Io("script exhausted".into())),
        }
    }
}

/// Telemetry sink that records everything, optionally failing every call.
#[derive(Default)]
pub struct RecordingTelemetry {
    pub started: Mutex<Vec<String>>,
    pub stopped: Mutex<Vec<HttpEvent>>,
    pub error_codes: Mutex<HashMap<Uuid, Option<Vec<String>>>>,
    pub fail: bool,
}

impl RecordingTelemetry {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    fn outcome(&self) -> Result<(), TelemetryError> {
        if self.fail {
            Err(TelemetryError("sink offline".into()))
        } else {
            Ok(())
        }
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn start_event(&self, request_id: &str, _event_name: &str) -> Result<(), TelemetryError> {
        self.started.lock().unwrap().push(request_id.to_string());
        self.outcome()
    }

    fn stop_event(&self, _request_id: &str, event: &HttpEvent) -> Result<(), TelemetryError> {
        self.stopped.lock().unwrap().push(event.clone());
        self.outcome()
    }

    fn record_last_error_codes(
        &self,
        correlation_id: Uuid,
        error_codes: Option<&[String]>,
    ) -> Result<(), TelemetryError> {
        self.error_codes.lock().unwrap().insert(correlation_id, error_codes.map(<[String]>::to_vec));
        self.outcome()
    }
}

/// Signer accepting every challenge with a fixed token.
pub struct FixedSigner;

impl JwsSigner for FixedSigner {
    fn accepts(&self, _challenge: &DeviceChallenge) -> bool {
        true
    }

    fn sign(&self, nonce: &str, _audience: &str) -> Result<String, SigningError> {
        Ok(format!("signed.{nonce}.jws"))
    }
}

pub fn context() -> RequestContext {
    context_with(|builder| builder)
}

pub fn context_with(
    configure: impl FnOnce(oidcflow_core::RequestContextBuilder) -> oidcflow_core::RequestContextBuilder,
) -> RequestContext {
    configure(
        RequestContext::builder(AUTHORITY)
            .resource(RESOURCE)
            .client_id(CLIENT_ID)
            .redirect_uri(REDIRECT_URI)
            .response_type("code"),
    )
    .build()
    .unwrap()
}

pub fn engine(context: RequestContext, transport: &ScriptedTransport) -> TokenExchangeEngine {
    TokenExchangeEngine::new(context, Arc::new(transport.clone())).with_settings(ExchangeSettings {
        timeout_retry_delay: Duration::ZERO,
        ..ExchangeSettings::default()
    })
}

/// Redirect URL carrying a valid state for `ctx` plus `params`.
pub fn redirect_for(ctx: &RequestContext, params: &[(&str, &str)]) -> String {
    let state = ProtocolState::for_request(ctx).encode();
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("state", &state);
    for (key, value) in params {
        query.append_pair(key, value);
    }
    format!("{REDIRECT_URI}?{}", query.finish())
}

pub fn form(body: &str) -> HashMap<String, String> {
    form_urlencoded::parse(body.as_bytes()).into_owned().collect()
}

pub fn id_token(payload: &serde_json::Value) -> String {
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

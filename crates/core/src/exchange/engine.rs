//! Token exchange engine
//!
//! One engine is bound to one [`RequestContext`]. Every operation takes
//! `&mut self`, so an engine can never have two exchanges in flight, and the
//! single timeout retry is spent at most once over the engine's lifetime.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use oidcflow_domain::constants::{
    headers, oauth2, pkeyauth, DEFAULT_EXPIRATION_TIME_SECS, HTTP_EVENT, HTTP_METHOD_POST,
};
use oidcflow_common::ErrorClassification;
use oidcflow_domain::{EngineConfig, TokenResult};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::challenge::ChallengeResponder;
use crate::error::{AuthError, AuthResult};
use crate::exchange::events::{report, EventScope};
use crate::exchange::policies::{AttemptError, DeviceChallengeLayer, TimeoutRetry, TransientFailure};
use crate::exchange::state::EngineState;
use crate::protocol::{redirect_parameters, ProtocolState, ProtocolUrlBuilder};
use crate::request::RequestContext;
use crate::response::{flatten_json_body, ClassifyContext, ResponseClassifier};
use crate::signing_ports::JwsSigner;
use crate::telemetry_ports::{HttpEvent, NoopTelemetry, TelemetrySink};
use crate::transport_ports::{HttpResponse, PostRequest, WebTransport};

/// Tunables for an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeSettings {
    /// Fixed delay before the single timeout retry.
    pub timeout_retry_delay: Duration,
    /// Lifetime assumed when a response carries no usable `expires_in`.
    pub default_expiration_secs: i64,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            timeout_retry_delay: Duration::from_secs(1),
            default_expiration_secs: DEFAULT_EXPIRATION_TIME_SECS,
        }
    }
}

impl From<&EngineConfig> for ExchangeSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            timeout_retry_delay: config.retry.timeout_retry_delay(),
            default_expiration_secs: config.tokens.default_expiration_secs,
        }
    }
}

/// Drives authorization-code and refresh-token exchanges.
pub struct TokenExchangeEngine {
    context: RequestContext,
    transport: Arc<dyn WebTransport>,
    telemetry: Arc<dyn TelemetrySink>,
    responder: ChallengeResponder,
    classifier: ResponseClassifier,
    timeout_retry: TimeoutRetry,
    state: EngineState,
}

impl std::fmt::Debug for TokenExchangeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenExchangeEngine")
            .field("context", &self.context)
            .field("state", &self.state)
            .field("retry_spent", &self.timeout_retry.is_spent())
            .finish_non_exhaustive()
    }
}

impl TokenExchangeEngine {
    pub fn new(context: RequestContext, transport: Arc<dyn WebTransport>) -> Self {
        let settings = ExchangeSettings::default();
        Self {
            context,
            transport,
            telemetry: Arc::new(NoopTelemetry),
            responder: ChallengeResponder::default(),
            classifier: ResponseClassifier::new(settings.default_expiration_secs),
            timeout_retry: TimeoutRetry::new(settings.timeout_retry_delay),
            state: EngineState::Idle,
        }
    }

    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Device certificate used to answer PKeyAuth challenges.
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn JwsSigner>) -> Self {
        self.responder = ChallengeResponder::new(Some(signer));
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ExchangeSettings) -> Self {
        self.classifier = ResponseClassifier::new(settings.default_expiration_secs);
        self.timeout_retry = TimeoutRetry::new(settings.timeout_retry_delay);
        self
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn urls(&self) -> ProtocolUrlBuilder<'_> {
        ProtocolUrlBuilder::new(&self.context)
    }

    /// Build the URL to open in the browser collaborator.
    ///
    /// # Errors
    /// [`AuthError::EncodingUnsupported`] when a required field is blank.
    pub fn authorization_request_url(&mut self) -> AuthResult<String> {
        let url = self.urls().authorization_request_url()?;
        self.state = EngineState::AwaitingRedirect;
        info!(correlation_id = %self.context.correlation_id(), "built authorization request");
        Ok(url)
    }

    /// Complete a sign-in from the final redirect URL.
    ///
    /// Validates `state`, then either returns the result carried by the
    /// redirect (error or implicit-flow token) or redeems the authorization
    /// code.
    ///
    /// # Errors
    /// [`AuthError::NoState`]/[`AuthError::BadState`] for a missing or foreign
    /// state; [`AuthError::UnrecognizedResponse`] for a redirect of no known
    /// shape; any error of [`Self::exchange_code`].
    pub fn get_token(&mut self, redirect_url: &str) -> AuthResult<TokenResult> {
        self.state = EngineState::AwaitingRedirect;
        let outcome = self.token_from_redirect(redirect_url);
        if !self.state.is_settled() {
            self.settle(&outcome);
        }
        outcome
    }

    fn token_from_redirect(&mut self, redirect_url: &str) -> AuthResult<TokenResult> {
        let params = redirect_parameters(redirect_url)?;
        let encoded = params.get(oauth2::STATE).ok_or_else(|| {
            warn!(correlation_id = %self.context.correlation_id(), "redirect has no state");
            AuthError::NoState
        })?;
        ProtocolState::decode(encoded)?.validate_for(&self.context)?;

        let ctx = ClassifyContext::now(Some(self.context.correlation_id()));
        match self.classifier.classify(&params, &ctx) {
            Some(TokenResult::AuthorizationCode { code }) if code.trim().is_empty() => {
                Err(AuthError::UnrecognizedResponse { status: None, body: String::new() })
            }
            Some(TokenResult::AuthorizationCode { code }) => self.exchange_code(&code),
            Some(result) => Ok(result),
            None => {
                warn!(correlation_id = %self.context.correlation_id(), "redirect carries no recognizable result");
                Err(AuthError::UnrecognizedResponse { status: None, body: String::new() })
            }
        }
    }

    /// Redeem an authorization code, bound to the context's PKCE verifier.
    ///
    /// # Errors
    /// Transport, server, challenge and unrecognized-response failures; see
    /// [`AuthError`].
    pub fn exchange_code(&mut self, code: &str) -> AuthResult<TokenResult> {
        self.state = EngineState::ExchangingCode;
        let body = self.urls().token_request_body(code);
        let outcome = body.and_then(|body| self.post_token_request(body, false));
        self.settle(&outcome);
        outcome
    }

    /// Redeem a refresh token.
    ///
    /// # Errors
    /// As [`Self::exchange_code`]; also [`AuthError::InvalidRequest`] for a
    /// blank refresh token.
    pub fn exchange_refresh_token(&mut self, refresh_token: &str) -> AuthResult<TokenResult> {
        self.state = EngineState::ExchangingRefresh;
        let body = self.urls().refresh_request_body(refresh_token);
        let outcome = body.and_then(|body| self.post_token_request(body, true));
        self.settle(&outcome);
        outcome
    }

    fn build_post(&self, body: String, advertise_pkeyauth: bool) -> PostRequest {
        let correlation_id = self.context.correlation_id();
        let mut request_headers = BTreeMap::new();
        request_headers.insert(headers::ACCEPT.to_string(), headers::ACCEPT_JSON.to_string());
        request_headers.insert(headers::CLIENT_REQUEST_ID.to_string(), correlation_id.to_string());
        request_headers.insert(headers::RETURN_CLIENT_REQUEST_ID.to_string(), "true".to_string());
        if advertise_pkeyauth {
            request_headers.insert(
                pkeyauth::TLS_INCAPABLE_HEADER.to_string(),
                pkeyauth::TLS_INCAPABLE_VERSION.to_string(),
            );
        }

        PostRequest {
            url: self.urls().token_endpoint(),
            headers: request_headers,
            body,
            content_type: headers::FORM_URLENCODED.to_string(),
            correlation_id,
        }
    }

    fn post_token_request(&mut self, body: String, advertise_pkeyauth: bool) -> AuthResult<TokenResult> {
        let request = self.build_post(body, advertise_pkeyauth);
        info!(
            correlation_id = %request.correlation_id,
            endpoint = %request.url,
            "posting token request"
        );

        let extended_lifetime = self.context.is_extended_lifetime_enabled();
        let Self { context, transport, telemetry, responder, classifier, timeout_retry, state } = self;
        let exchange = PostExchange {
            context: &*context,
            transport: transport.as_ref(),
            telemetry: telemetry.as_ref(),
            classifier: *classifier,
        };
        let challenge = DeviceChallengeLayer::new(&*responder);
        // Once the challenge has been answered, a retry resends the answered
        // POST instead of starting over with the bare one.
        let mut answered: Option<PostRequest> = None;

        timeout_retry.run(extended_lifetime, |attempt| {
            let mut events = EventScope::new(exchange.telemetry);
            let response = if let Some(resend) = answered.clone() {
                exchange.send_once(&mut events, &resend, attempt, true)?
            } else {
                challenge.send(&request, |outgoing, nested| {
                    if nested {
                        *state = EngineState::AwaitingDeviceChallenge;
                        answered = Some(outgoing.clone());
                    }
                    exchange.send_once(&mut events, outgoing, attempt, nested)
                })?
            };
            exchange.interpret(&response, events.current())
        })
    }

    fn settle(&mut self, outcome: &AuthResult<TokenResult>) {
        let correlation_id = self.context.correlation_id();
        let error_codes = match outcome {
            Ok(result) => result.error_codes(),
            Err(_) => None,
        };
        report(self.telemetry.record_last_error_codes(correlation_id, error_codes));

        self.state = match outcome {
            Ok(result) if result.is_success() => EngineState::SettledSuccess,
            _ => EngineState::SettledError,
        };
        match outcome {
            Ok(result) => debug!(%correlation_id, success = result.is_success(), "exchange settled"),
            Err(err) if err.is_critical() => {
                error!(%correlation_id, error = %err, severity = %err.severity(), "exchange rejected");
            }
            Err(err) => warn!(%correlation_id, error = %err, severity = %err.severity(), "exchange failed"),
        }
    }
}

/// Borrowed pieces of the engine needed for one POST attempt.
struct PostExchange<'a> {
    context: &'a RequestContext,
    transport: &'a dyn WebTransport,
    telemetry: &'a dyn TelemetrySink,
    classifier: ResponseClassifier,
}

impl PostExchange<'_> {
    fn send_once(
        &self,
        events: &mut EventScope<'_>,
        request: &PostRequest,
        attempt: u32,
        nested: bool,
    ) -> Result<HttpResponse, AttemptError> {
        events.begin(HttpEvent {
            name: HTTP_EVENT.to_string(),
            request_id: self.context.telemetry_request_id().to_string(),
            method: HTTP_METHOD_POST.to_string(),
            path: request.url.split('?').next().unwrap_or_default().to_string(),
            correlation_id: Some(request.correlation_id),
            attempt,
            nested,
            ..HttpEvent::default()
        });

        let response = self.transport.send_post(request)?;
        debug!(status = response.status, attempt, nested, "token endpoint responded");
        if let Some(event) = events.current() {
            event.response_code = Some(response.status);
            event.server_request_id = response.header(headers::REQUEST_ID).map(str::to_string);
        }
        Ok(response)
    }

    fn interpret(
        &self,
        response: &HttpResponse,
        event: Option<&mut HttpEvent>,
    ) -> Result<TokenResult, AttemptError> {
        self.check_echoed_correlation_id(response);

        let status = response.status;
        if response.body.trim().is_empty() {
            return Err(AuthError::ServerError { status: Some(status), body: String::new() }.into());
        }

        match status {
            200 | 400 | 401 => {
                let params = flatten_json_body(&response.body).map_err(|err| {
                    warn!(status, error = %err, "token response body is not a JSON object");
                    AuthError::ServerError { status: Some(status), body: response.body.clone() }
                })?;
                let ctx = ClassifyContext::now(Some(self.context.correlation_id()));
                match self.classifier.classify(&params, &ctx) {
                    Some(TokenResult::AuthorizationCode { .. }) | None => {
                        Err(AuthError::UnrecognizedResponse { status: Some(status), body: response.body.clone() }
                            .into())
                    }
                    Some(result) => {
                        if let (Some(event), Some(code)) = (event, result.error_code()) {
                            event.oauth_error_code = Some(code.to_string());
                        }
                        Ok(result)
                    }
                }
            }
            500..=599 => Err(AttemptError::Transient(TransientFailure::ServerStatus {
                status,
                body: response.body.clone(),
            })),
            _ => Err(AuthError::ServerError { status: Some(status), body: response.body.clone() }.into()),
        }
    }

    fn check_echoed_correlation_id(&self, response: &HttpResponse) {
        let Some(echoed) = response.header(headers::CLIENT_REQUEST_ID) else {
            return;
        };
        let expected = self.context.correlation_id();
        match Uuid::parse_str(echoed.trim()) {
            Ok(got) if got == expected => {}
            Ok(got) => warn!(%got, %expected, "response correlation id does not match the request"),
            Err(err) => warn!(echoed, error = %err, "response correlation id is malformed"),
        }
    }
}

//! Per-attempt authentication request description
//!
//! A [`RequestContext`] is built once per logical sign-in or refresh attempt
//! and is immutable afterwards. The only interior state is the PKCE pair,
//! generated on first use and then fixed for the lifetime of the context so
//! the challenge sent to the authorize endpoint always matches the verifier
//! sent to the token endpoint.

use std::fmt;
use std::sync::OnceLock;

use oidcflow_common::PkcePair;
use oidcflow_domain::UserIdentifierKind;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// Immutable description of one authentication attempt.
pub struct RequestContext {
    authority: String,
    endpoint_fragment: Option<String>,
    response_type: Option<String>,
    resource: String,
    client_id: String,
    redirect_uri: String,
    login_hint: Option<String>,
    user_id: Option<String>,
    identifier_kind: UserIdentifierKind,
    extra_query_params: Option<String>,
    claims_challenge: Option<String>,
    correlation_id: Uuid,
    telemetry_request_id: String,
    extended_lifetime_enabled: bool,
    pkce: OnceLock<PkcePair>,
}

impl RequestContext {
    /// Start building a context for `authority`.
    pub fn builder(authority: impl Into<String>) -> RequestContextBuilder {
        RequestContextBuilder::new(authority)
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn endpoint_fragment(&self) -> Option<&str> {
        self.endpoint_fragment.as_deref()
    }

    pub fn response_type(&self) -> Option<&str> {
        self.response_type.as_deref()
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn login_hint(&self) -> Option<&str> {
        self.login_hint.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn identifier_kind(&self) -> UserIdentifierKind {
        self.identifier_kind
    }

    pub fn extra_query_params(&self) -> Option<&str> {
        self.extra_query_params.as_deref()
    }

    pub fn claims_challenge(&self) -> Option<&str> {
        self.claims_challenge.as_deref()
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn telemetry_request_id(&self) -> &str {
        &self.telemetry_request_id
    }

    /// Whether transient failures should surface as retryable rather than
    /// hard server errors.
    pub fn is_extended_lifetime_enabled(&self) -> bool {
        self.extended_lifetime_enabled
    }

    /// The PKCE verifier, generated on first access.
    pub fn code_verifier(&self) -> &str {
        &self.pkce().code_verifier
    }

    /// S256 challenge of [`Self::code_verifier`].
    pub fn code_challenge(&self) -> &str {
        &self.pkce().code_challenge
    }

    fn pkce(&self) -> &PkcePair {
        self.pkce.get_or_init(|| {
            debug!(correlation_id = %self.correlation_id, "generating PKCE verifier");
            PkcePair::generate()
        })
    }

    /// The user hint matching the identifier kind, if any.
    pub fn user_from_request(&self) -> Option<&str> {
        match self.identifier_kind {
            UserIdentifierKind::LoginHint => self.login_hint(),
            UserIdentifierKind::UniqueId => self.user_id(),
            UserIdentifierKind::None => None,
        }
    }

    /// Domain part of the login hint (`"contoso.com"` for `"a@contoso.com"`).
    pub fn upn_suffix(&self) -> Option<&str> {
        let hint = self.login_hint()?;
        let (_, suffix) = hint.rsplit_once('@')?;
        (!suffix.is_empty()).then_some(suffix)
    }
}

impl fmt::Debug for RequestContext {
    // Omits the PKCE verifier.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("authority", &self.authority)
            .field("resource", &self.resource)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("identifier_kind", &self.identifier_kind)
            .field("correlation_id", &self.correlation_id)
            .field("extended_lifetime_enabled", &self.extended_lifetime_enabled)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    authority: String,
    endpoint_fragment: Option<String>,
    response_type: Option<String>,
    resource: String,
    client_id: String,
    redirect_uri: String,
    login_hint: Option<String>,
    user_id: Option<String>,
    identifier_kind: UserIdentifierKind,
    extra_query_params: Option<String>,
    claims_challenge: Option<String>,
    correlation_id: Option<Uuid>,
    telemetry_request_id: Option<String>,
    extended_lifetime_enabled: bool,
    code_verifier: Option<String>,
}

impl RequestContextBuilder {
    fn new(authority: impl Into<String>) -> Self {
        Self { authority: authority.into(), ..Self::default() }
    }

    /// Path segment replacing the default `/connect`, or an absolute
    /// `https://` endpoint base.
    #[must_use]
    pub fn endpoint_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.endpoint_fragment = Some(fragment.into());
        self
    }

    #[must_use]
    pub fn response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    #[must_use]
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    #[must_use]
    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    /// Set a login hint; the identifier kind becomes `LoginHint`.
    #[must_use]
    pub fn login_hint(mut self, hint: impl Into<String>) -> Self {
        self.login_hint = Some(hint.into());
        self.identifier_kind = UserIdentifierKind::LoginHint;
        self
    }

    /// Set a unique user id; the identifier kind becomes `UniqueId`.
    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.identifier_kind = UserIdentifierKind::UniqueId;
        self
    }

    #[must_use]
    pub fn identifier_kind(mut self, kind: UserIdentifierKind) -> Self {
        self.identifier_kind = kind;
        self
    }

    /// Raw query string appended verbatim to the authorization request.
    #[must_use]
    pub fn extra_query_params(mut self, params: impl Into<String>) -> Self {
        self.extra_query_params = Some(params.into());
        self
    }

    #[must_use]
    pub fn claims_challenge(mut self, claims: impl Into<String>) -> Self {
        self.claims_challenge = Some(claims.into());
        self
    }

    #[must_use]
    pub fn correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    #[must_use]
    pub fn telemetry_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.telemetry_request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn extended_lifetime(mut self, enabled: bool) -> Self {
        self.extended_lifetime_enabled = enabled;
        self
    }

    /// Pin the PKCE verifier instead of generating one.
    #[must_use]
    pub fn code_verifier(mut self, verifier: impl Into<String>) -> Self {
        self.code_verifier = Some(verifier.into());
        self
    }

    /// Finish the context.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidRequest`] when the authority is blank.
    pub fn build(self) -> AuthResult<RequestContext> {
        let authority = self.authority.trim().to_string();
        if authority.is_empty() {
            return Err(AuthError::InvalidRequest("authority must not be empty".into()));
        }

        let pkce = OnceLock::new();
        if let Some(verifier) = self.code_verifier {
            let _ = pkce.set(PkcePair::from_verifier(verifier));
        }

        Ok(RequestContext {
            authority,
            endpoint_fragment: self.endpoint_fragment,
            response_type: self.response_type,
            resource: self.resource,
            client_id: self.client_id,
            redirect_uri: self.redirect_uri,
            login_hint: self.login_hint,
            user_id: self.user_id,
            identifier_kind: self.identifier_kind,
            extra_query_params: self.extra_query_params,
            claims_challenge: self.claims_challenge,
            correlation_id: self.correlation_id.unwrap_or_else(Uuid::new_v4),
            telemetry_request_id: self
                .telemetry_request_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            extended_lifetime_enabled: self.extended_lifetime_enabled,
            pkce,
        })
    }
}

//! Endpoint derivation and request message construction

use oidcflow_common::auth::pkce::CHALLENGE_METHOD_S256;
use oidcflow_domain::constants::{
    oauth2, AUTHORIZE_ENDPOINT_SUFFIX, DEFAULT_ENDPOINT_FRAGMENT, RESPONSE_TYPE_CODE_PREFIX,
    RESPONSE_TYPE_ID_TOKEN, SECURE_REDIRECT_PREFIX, TOKEN_ENDPOINT_SUFFIX,
};
use oidcflow_domain::UserIdentifierKind;
use url::form_urlencoded;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::protocol::state::ProtocolState;
use crate::request::RequestContext;

/// Builds protocol URLs and bodies for one [`RequestContext`].
#[derive(Debug, Clone, Copy)]
pub struct ProtocolUrlBuilder<'a> {
    context: &'a RequestContext,
}

impl<'a> ProtocolUrlBuilder<'a> {
    pub fn new(context: &'a RequestContext) -> Self {
        Self { context }
    }

    pub fn authorize_endpoint(&self) -> String {
        self.endpoint(AUTHORIZE_ENDPOINT_SUFFIX)
    }

    pub fn token_endpoint(&self) -> String {
        self.endpoint(TOKEN_ENDPOINT_SUFFIX)
    }

    fn endpoint(&self, suffix: &str) -> String {
        let authority = self.context.authority().trim_end_matches('/');
        match self.context.endpoint_fragment().map(str::trim).filter(|f| !f.is_empty()) {
            None => format!("{authority}{DEFAULT_ENDPOINT_FRAGMENT}{suffix}"),
            Some(fragment) if starts_with_ignore_case(fragment, SECURE_REDIRECT_PREFIX) => {
                format!("{}{suffix}", fragment.trim_end_matches('/'))
            }
            Some(fragment) => {
                let fragment = fragment.trim_matches('/');
                format!("{authority}/{fragment}{suffix}")
            }
        }
    }

    /// Response type requested from the authorize endpoint.
    pub fn response_type(&self) -> &str {
        self.context
            .response_type()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(RESPONSE_TYPE_ID_TOKEN)
    }

    /// Whether the request uses the authorization code flow (and thus PKCE).
    pub fn is_code_flow(&self) -> bool {
        starts_with_ignore_case(self.response_type(), RESPONSE_TYPE_CODE_PREFIX)
    }

    /// Render the authorization request query string.
    ///
    /// A fresh nonce is generated on every call.
    ///
    /// # Errors
    /// [`AuthError::EncodingUnsupported`] when `client_id` or `redirect_uri`
    /// is blank and so has no encoded form.
    pub fn authorization_query(&self) -> AuthResult<String> {
        let client_id = required(oauth2::CLIENT_ID, self.context.client_id())?;
        let redirect_uri = required(oauth2::REDIRECT_URI, self.context.redirect_uri())?;
        let state = ProtocolState::for_request(self.context).encode();
        let nonce = Uuid::new_v4().to_string();

        let mut pairs: Vec<(&str, &str)> = vec![
            (oauth2::RESPONSE_TYPE, self.response_type()),
            (oauth2::CLIENT_ID, client_id),
            (oauth2::REDIRECT_URI, redirect_uri),
            (oauth2::STATE, &state),
            (oauth2::NONCE, &nonce),
        ];

        if self.is_code_flow() {
            pairs.push((oauth2::CODE_CHALLENGE, self.context.code_challenge()));
            pairs.push((oauth2::CODE_CHALLENGE_METHOD, CHALLENGE_METHOD_S256));
        }

        if self.context.identifier_kind() == UserIdentifierKind::LoginHint {
            if let Some(hint) = self.context.login_hint().filter(|h| !h.trim().is_empty()) {
                pairs.push((oauth2::LOGIN_HINT, hint));
            }
        }

        if let Some(claims) = self.context.claims_challenge().filter(|c| !c.trim().is_empty()) {
            pairs.push((oauth2::CLAIMS, claims));
        }

        let mut query = pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        if let Some(extra) = self.context.extra_query_params().filter(|e| !e.trim().is_empty()) {
            if !extra.starts_with('&') {
                query.push('&');
            }
            query.push_str(extra);
        }

        Ok(query)
    }

    /// Full authorize URL: endpoint plus query.
    ///
    /// # Errors
    /// See [`Self::authorization_query`].
    pub fn authorization_request_url(&self) -> AuthResult<String> {
        Ok(format!("{}?{}", self.authorize_endpoint(), self.authorization_query()?))
    }

    /// Form body exchanging `code` for tokens, bound to this context's PKCE
    /// verifier.
    ///
    /// # Errors
    /// [`AuthError::InvalidRequest`] when `code` is blank.
    pub fn token_request_body(&self, code: &str) -> AuthResult<String> {
        if code.trim().is_empty() {
            return Err(AuthError::InvalidRequest("authorization code is blank".into()));
        }

        Ok(form_urlencoded::Serializer::new(String::new())
            .append_pair(oauth2::GRANT_TYPE, oauth2::AUTHORIZATION_CODE)
            .append_pair(oauth2::CODE, code)
            .append_pair(oauth2::CLIENT_ID, self.context.client_id())
            .append_pair(oauth2::REDIRECT_URI, self.context.redirect_uri())
            .append_pair(oauth2::CODE_VERIFIER, self.context.code_verifier())
            .finish())
    }

    /// Form body redeeming `refresh_token`.
    ///
    /// # Errors
    /// [`AuthError::InvalidRequest`] when `refresh_token` is blank.
    pub fn refresh_request_body(&self, refresh_token: &str) -> AuthResult<String> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidRequest("refresh token is blank".into()));
        }

        let mut body = form_urlencoded::Serializer::new(String::new());
        body.append_pair(oauth2::GRANT_TYPE, oauth2::REFRESH_TOKEN)
            .append_pair(oauth2::REFRESH_TOKEN, refresh_token)
            .append_pair(oauth2::CLIENT_ID, self.context.client_id());
        if !self.context.resource().trim().is_empty() {
            body.append_pair(oauth2::RESOURCE, self.context.resource());
        }
        Ok(body.finish())
    }
}

fn required<'v>(field: &'static str, value: &'v str) -> AuthResult<&'v str> {
    if value.trim().is_empty() {
        Err(AuthError::EncodingUnsupported { field })
    } else {
        Ok(value)
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn builder_for(fragment: Option<&str>) -> RequestContext {
        let mut builder = RequestContext::builder("https://login.example.com")
            .resource("https://graph.example.com")
            .client_id("client 1")
            .redirect_uri("https://app.example.com/cb");
        if let Some(fragment) = fragment {
            builder = builder.endpoint_fragment(fragment);
        }
        builder.build().unwrap()
    }

    fn query_map(query: &str) -> HashMap<String, String> {
        form_urlencoded::parse(query.as_bytes()).into_owned().collect()
    }

    #[test]
    fn default_fragment_is_connect() {
        let ctx = builder_for(None);
        let urls = ProtocolUrlBuilder::new(&ctx);
        assert_eq!(urls.authorize_endpoint(), "https://login.example.com/connect/authorize");
        assert_eq!(urls.token_endpoint(), "https://login.example.com/connect/token");
    }

    #[test]
    fn relative_fragment_is_joined_with_one_slash() {
        let ctx = builder_for(Some("tenantA"));
        assert_eq!(
            ProtocolUrlBuilder::new(&ctx).authorize_endpoint(),
            "https://login.example.com/tenantA/authorize"
        );

        let ctx = builder_for(Some("/tenantA/"));
        assert_eq!(
            ProtocolUrlBuilder::new(&ctx).token_endpoint(),
            "https://login.example.com/tenantA/token"
        );
    }

    #[test]
    fn absolute_fragment_replaces_authority() {
        let ctx = builder_for(Some("https://sts.example.net/oauth2"));
        assert_eq!(
            ProtocolUrlBuilder::new(&ctx).token_endpoint(),
            "https://sts.example.net/oauth2/token"
        );
    }

    #[test]
    fn id_token_query_has_no_pkce() {
        let ctx = builder_for(None);
        let query = ProtocolUrlBuilder::new(&ctx).authorization_query().unwrap();
        let keys: Vec<String> =
            form_urlencoded::parse(query.as_bytes()).map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, ["response_type", "client_id", "redirect_uri", "state", "nonce"]);

        let params = query_map(&query);
        assert_eq!(params["response_type"], "id_token");
        assert_eq!(params["client_id"], "client 1");
        assert!(query.contains("client_id=client%201"));
        let state = ProtocolState::decode(&params["state"]).unwrap();
        assert_eq!(state.resource, "https://graph.example.com");
    }

    #[test]
    fn code_flow_adds_challenge_matching_verifier() {
        let ctx = RequestContext::builder("https://login.example.com")
            .response_type("code id_token")
            .client_id("c")
            .redirect_uri("https://app.example.com/cb")
            .build()
            .unwrap();
        let params = query_map(&ProtocolUrlBuilder::new(&ctx).authorization_query().unwrap());
        assert_eq!(params["code_challenge"], ctx.code_challenge());
        assert_eq!(params["code_challenge_method"], "S256");
    }

    #[test]
    fn nonce_is_fresh_per_call() {
        let ctx = builder_for(None);
        let urls = ProtocolUrlBuilder::new(&ctx);
        let first = query_map(&urls.authorization_query().unwrap());
        let second = query_map(&urls.authorization_query().unwrap());
        assert_ne!(first["nonce"], second["nonce"]);
        assert_eq!(first["state"], second["state"]);
    }

    #[test]
    fn claims_hint_and_extra_params_are_appended() {
        let ctx = RequestContext::builder("https://login.example.com")
            .client_id("c")
            .redirect_uri("https://app.example.com/cb")
            .login_hint("alice@contoso.com")
            .claims_challenge(r#"{"access_token":{"acrs":{"essential":true}}}"#)
            .extra_query_params("prompt=login&client_id=dup")
            .build()
            .unwrap();
        let query = ProtocolUrlBuilder::new(&ctx).authorization_query().unwrap();
        assert!(query.ends_with("&prompt=login&client_id=dup"));
        let params: Vec<(String, String)> =
            form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        assert!(params.contains(&("login_hint".into(), "alice@contoso.com".into())));
        assert!(params.iter().any(|(k, v)| k == "claims" && v.contains("acrs")));
        assert_eq!(params.iter().filter(|(k, _)| k == "client_id").count(), 2);
    }

    #[test]
    fn blank_required_field_is_an_encoding_error() {
        let ctx = RequestContext::builder("https://login.example.com")
            .client_id("c")
            .build()
            .unwrap();
        assert_eq!(
            ProtocolUrlBuilder::new(&ctx).authorization_query(),
            Err(AuthError::EncodingUnsupported { field: "redirect_uri" })
        );
    }

    #[test]
    fn token_body_carries_the_context_verifier() {
        let ctx = builder_for(None);
        let body = ProtocolUrlBuilder::new(&ctx).token_request_body("C1").unwrap();
        let params = query_map(&body);
        assert_eq!(params["grant_type"], "authorization_code");
        assert_eq!(params["code"], "C1");
        assert_eq!(params["code_verifier"], ctx.code_verifier());
        assert_eq!(params["redirect_uri"], "https://app.example.com/cb");
    }

    #[test]
    fn refresh_body_omits_blank_resource() {
        let ctx = RequestContext::builder("https://login.example.com")
            .client_id("c")
            .build()
            .unwrap();
        let urls = ProtocolUrlBuilder::new(&ctx);
        let params = query_map(&urls.refresh_request_body("RT1").unwrap());
        assert_eq!(params["grant_type"], "refresh_token");
        assert_eq!(params["refresh_token"], "RT1");
        assert!(!params.contains_key("resource"));
        assert!(!params.contains_key("code_verifier"));

        assert!(matches!(urls.refresh_request_body(" "), Err(AuthError::InvalidRequest(_))));
    }
}

//! Response classification
//!
//! Turns the flat parameter map of a redirect or token response into a
//! [`TokenResult`]. The priority order is fixed: error, bare code, access
//! token, ID token alone. Anything else is `None`.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use oidcflow_domain::constants::{oauth2, DEFAULT_EXPIRATION_TIME_SECS};
use oidcflow_domain::{IdToken, PrimaryToken, ProtocolError, TokenResult, TokenSuccess, UserInfo};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

/// Which branch a response map falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Error,
    AuthorizationCode,
    AccessToken,
    IdTokenOnly,
    Unrecognized,
}

impl ResponseShape {
    pub fn of(response: &HashMap<String, String>) -> Self {
        let has = |key: &str| response.contains_key(key);
        match (has(oauth2::ERROR), has(oauth2::CODE), has(oauth2::ACCESS_TOKEN), has(oauth2::ID_TOKEN)) {
            (true, _, _, _) => Self::Error,
            (false, true, false, false) => Self::AuthorizationCode,
            (false, _, true, _) => Self::AccessToken,
            (false, _, false, true) => Self::IdTokenOnly,
            (false, false, false, false) => Self::Unrecognized,
        }
    }
}

/// Per-response inputs that are not part of the map.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext {
    /// Moment the response was received; all expiries are relative to it.
    pub received_at: DateTime<Utc>,
    /// Correlation id of the request, checked against an echoed one.
    pub correlation_id: Option<Uuid>,
}

impl ClassifyContext {
    pub fn now(correlation_id: Option<Uuid>) -> Self {
        Self { received_at: Utc::now(), correlation_id }
    }
}

/// Pure classifier from response parameters to [`TokenResult`].
#[derive(Debug, Clone, Copy)]
pub struct ResponseClassifier {
    default_expiration_secs: i64,
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRATION_TIME_SECS)
    }
}

impl ResponseClassifier {
    pub fn new(default_expiration_secs: i64) -> Self {
        Self { default_expiration_secs }
    }

    /// Classify `response`. `None` means the shape was not recognized.
    pub fn classify(
        &self,
        response: &HashMap<String, String>,
        ctx: &ClassifyContext,
    ) -> Option<TokenResult> {
        match ResponseShape::of(response) {
            ResponseShape::Error => Some(Self::protocol_error(response, ctx)),
            ResponseShape::AuthorizationCode => Some(TokenResult::AuthorizationCode {
                code: response.get(oauth2::CODE).cloned().unwrap_or_default(),
            }),
            ResponseShape::AccessToken => Some(self.access_token_success(response, ctx)),
            ResponseShape::IdTokenOnly => self.id_token_success(response, ctx),
            ResponseShape::Unrecognized => None,
        }
    }

    fn protocol_error(response: &HashMap<String, String>, ctx: &ClassifyContext) -> TokenResult {
        if let Some(echoed) = response.get(oauth2::CORRELATION_ID) {
            check_correlation_id(echoed, ctx.correlation_id);
        }

        let code = response.get(oauth2::ERROR).cloned().unwrap_or_default();
        let description = non_blank(response.get(oauth2::ERROR_DESCRIPTION));
        let error_codes = response
            .get(oauth2::ERROR_CODES)
            .map(String::as_str)
            .map(parse_error_codes)
            .unwrap_or_default();
        debug!(error = %code, error_codes = ?error_codes, "server returned a protocol error");

        TokenResult::ProtocolError(ProtocolError { code, description, error_codes })
    }

    fn access_token_success(&self, response: &HashMap<String, String>, ctx: &ClassifyContext) -> TokenResult {
        let access_token = response.get(oauth2::ACCESS_TOKEN).cloned().unwrap_or_default();
        let refresh_token = non_blank(response.get(oauth2::REFRESH_TOKEN));

        let expires_on = self.expiry(ctx.received_at, response.get(oauth2::EXPIRES_IN));
        let extended_expires_on = response
            .get(oauth2::EXT_EXPIRES_IN)
            .map(|raw| self.expiry(ctx.received_at, Some(raw)));

        let is_multi_resource_refresh_token =
            response.contains_key(oauth2::RESOURCE) && refresh_token.is_some();

        let raw_id_token = non_blank(response.get(oauth2::ID_TOKEN));
        let id_token = raw_id_token.as_deref().and_then(parse_id_token);
        let (user_info, tenant_id) = match &id_token {
            Some(token) => (Some(UserInfo::from_id_token(token, ctx.received_at)), token.tenant_id.clone()),
            None => (None, None),
        };

        TokenResult::Success(TokenSuccess {
            token: PrimaryToken::AccessToken(access_token),
            refresh_token,
            expires_on,
            extended_expires_on,
            is_multi_resource_refresh_token,
            user_info,
            tenant_id,
            raw_id_token,
            family_client_id: non_blank(response.get(oauth2::FAMILY_CLIENT_ID)),
        })
    }

    fn id_token_success(&self, response: &HashMap<String, String>, ctx: &ClassifyContext) -> Option<TokenResult> {
        let Some(raw) = non_blank(response.get(oauth2::ID_TOKEN)) else {
            warn!("response carries only a blank id_token");
            return None;
        };

        let id_token = parse_id_token(&raw);
        let lifetime = id_token
            .as_ref()
            .and_then(IdToken::lifetime_secs)
            .unwrap_or(self.default_expiration_secs);
        let (user_info, tenant_id) = match &id_token {
            Some(token) => (Some(UserInfo::from_id_token(token, ctx.received_at)), token.tenant_id.clone()),
            None => (None, None),
        };

        Some(TokenResult::Success(TokenSuccess {
            token: PrimaryToken::IdToken(raw.clone()),
            refresh_token: non_blank(response.get(oauth2::REFRESH_TOKEN)),
            expires_on: add_secs(ctx.received_at, lifetime),
            extended_expires_on: response
                .get(oauth2::EXT_EXPIRES_IN)
                .map(|raw| self.expiry(ctx.received_at, Some(raw))),
            is_multi_resource_refresh_token: false,
            user_info,
            tenant_id,
            raw_id_token: Some(raw),
            family_client_id: non_blank(response.get(oauth2::FAMILY_CLIENT_ID)),
        }))
    }

    fn expiry(&self, received_at: DateTime<Utc>, raw: Option<&String>) -> DateTime<Utc> {
        let secs = raw
            .and_then(|value| value.trim().parse::<i64>().ok())
            .unwrap_or(self.default_expiration_secs);
        add_secs(received_at, secs)
    }
}

fn add_secs(at: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    Duration::try_seconds(secs)
        .and_then(|lifetime| at.checked_add_signed(lifetime))
        .unwrap_or(at)
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

fn parse_id_token(raw: &str) -> Option<IdToken> {
    match IdToken::parse(raw) {
        Ok(token) => Some(token),
        Err(err) => {
            warn!(error = %err, "ignoring malformed id_token");
            None
        }
    }
}

/// Accepts a JSON array (`[70008,50076]`) or a comma separated list.
fn parse_error_codes(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) {
        return items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => text,
                other => other.to_string(),
            })
            .collect();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

fn check_correlation_id(echoed: &str, expected: Option<Uuid>) {
    match (Uuid::parse_str(echoed.trim()), expected) {
        (Err(err), _) => warn!(echoed, error = %err, "server echoed a malformed correlation id"),
        (Ok(got), Some(expected)) if got != expected => {
            warn!(%got, %expected, "server echoed a different correlation id");
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    fn id_token(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        format!("{header}.{}.", URL_SAFE_NO_PAD.encode(payload.to_string()))
    }

    fn classify(pairs: &[(&str, &str)]) -> (Option<TokenResult>, DateTime<Utc>) {
        let ctx = ClassifyContext::now(None);
        (ResponseClassifier::default().classify(&map(pairs), &ctx), ctx.received_at)
    }

    #[test]
    fn error_key_yields_protocol_error() {
        let (result, _) = classify(&[("error", "invalid_grant"), ("error_description", "expired")]);
        match result {
            Some(TokenResult::ProtocolError(err)) => {
                assert_eq!(err.code, "invalid_grant");
                assert_eq!(err.description.as_deref(), Some("expired"));
                assert!(err.error_codes.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_wins_over_tokens() {
        let (result, _) = classify(&[("error", "interaction_required"), ("access_token", "AT1"), ("code", "C1")]);
        assert_eq!(result.unwrap().error_code(), Some("interaction_required"));
    }

    #[test]
    fn error_codes_accept_array_or_list() {
        let (result, _) = classify(&[("error", "e"), ("error_codes", "[70008,50076]")]);
        assert_eq!(result.unwrap().error_codes(), Some(&["70008".to_string(), "50076".to_string()][..]));

        let (result, _) = classify(&[("error", "e"), ("error_codes", "70008, 50076")]);
        assert_eq!(result.unwrap().error_codes().map(<[String]>::len), Some(2));
    }

    #[test]
    fn mismatched_correlation_id_does_not_fail() {
        let ctx = ClassifyContext::now(Some(Uuid::new_v4()));
        let response = map(&[("error", "e"), ("correlation_id", "not-a-uuid")]);
        let result = ResponseClassifier::default().classify(&response, &ctx);
        assert_eq!(result.unwrap().error_code(), Some("e"));
    }

    #[test]
    fn bare_code_yields_authorization_code() {
        let (result, _) = classify(&[("code", "C1"), ("state", "s")]);
        assert_eq!(result, Some(TokenResult::AuthorizationCode { code: "C1".into() }));
    }

    #[test]
    fn code_with_access_token_is_success() {
        let (result, _) = classify(&[("code", "C1"), ("access_token", "AT1")]);
        assert!(result.unwrap().is_success());
    }

    #[test]
    fn access_token_expiry_is_relative_to_receipt() {
        let (result, received_at) = classify(&[("access_token", "AT1"), ("expires_in", "3600")]);
        let success = result.unwrap().as_success().cloned().unwrap();
        assert_eq!(success.access_token(), Some("AT1"));
        assert_eq!(success.expires_on, received_at + Duration::seconds(3600));
        assert!(!success.is_multi_resource_refresh_token);
        assert!(success.user_info.is_none());
        assert!(success.extended_expires_on.is_none());
    }

    #[test]
    fn unparseable_expiry_uses_default() {
        let classifier = ResponseClassifier::new(120);
        let ctx = ClassifyContext::now(None);
        let response = map(&[("access_token", "AT1"), ("expires_in", "soon"), ("ext_expires_in", "7200")]);
        let success = classifier.classify(&response, &ctx).unwrap().as_success().cloned().unwrap();
        assert_eq!(success.expires_on, ctx.received_at + Duration::seconds(120));
        assert_eq!(success.extended_expires_on, Some(ctx.received_at + Duration::seconds(7200)));
    }

    #[test]
    fn resource_with_refresh_token_is_multi_resource() {
        let (result, _) = classify(&[("access_token", "AT1"), ("resource", "R"), ("refresh_token", "RT1")]);
        let success = result.unwrap().as_success().cloned().unwrap();
        assert!(success.is_multi_resource_refresh_token);
        assert_eq!(success.refresh_token.as_deref(), Some("RT1"));

        let (result, _) = classify(&[("access_token", "AT1"), ("resource", "R"), ("refresh_token", " ")]);
        assert!(!result.unwrap().as_success().unwrap().is_multi_resource_refresh_token);
    }

    #[test]
    fn id_token_alongside_populates_identity() {
        let raw = id_token(&serde_json::json!({"tid": "tenant-a", "oid": "o1", "upn": "a@contoso.com"}));
        let (result, _) = classify(&[("access_token", "AT1"), ("id_token", raw.as_str()), ("foci", "1")]);
        let success = result.unwrap().as_success().cloned().unwrap();
        assert_eq!(success.tenant_id.as_deref(), Some("tenant-a"));
        let user = success.user_info.unwrap();
        assert_eq!(user.unique_id.as_deref(), Some("o1"));
        assert_eq!(user.displayable_id.as_deref(), Some("a@contoso.com"));
        assert_eq!(success.raw_id_token.as_deref(), Some(raw.as_str()));
        assert_eq!(success.family_client_id.as_deref(), Some("1"));
    }

    #[test]
    fn malformed_id_token_leaves_identity_empty() {
        let (result, _) = classify(&[("access_token", "AT1"), ("id_token", "garbage")]);
        let success = result.unwrap().as_success().cloned().unwrap();
        assert!(success.user_info.is_none());
        assert!(success.tenant_id.is_none());
        assert_eq!(success.access_token(), Some("AT1"));
    }

    #[test]
    fn id_token_alone_uses_its_own_lifetime() {
        let raw = id_token(&serde_json::json!({"sub": "s", "iat": 1_000, "exp": 1_600}));
        let (result, received_at) = classify(&[("id_token", raw.as_str())]);
        let success = result.unwrap().as_success().cloned().unwrap();
        assert_eq!(success.token, PrimaryToken::IdToken(raw));
        assert_eq!(success.access_token(), None);
        assert_eq!(success.expires_on, received_at + Duration::seconds(600));
        assert!(success.extended_expires_on.is_none());
    }

    #[test]
    fn id_token_alone_honours_extended_expiry() {
        let raw = id_token(&serde_json::json!({"sub": "s", "iat": 1_000, "exp": 1_600}));
        let (result, received_at) = classify(&[("id_token", raw.as_str()), ("ext_expires_in", "7200")]);
        let success = result.unwrap().as_success().cloned().unwrap();
        assert_eq!(success.expires_on, received_at + Duration::seconds(600));
        assert_eq!(success.extended_expires_on, Some(received_at + Duration::seconds(7200)));
    }

    #[test]
    fn id_token_alone_without_claims_uses_default() {
        let raw = id_token(&serde_json::json!({"sub": "s"}));
        let (result, received_at) = classify(&[("id_token", raw.as_str())]);
        let expires_on = result.unwrap().as_success().unwrap().expires_on;
        assert_eq!(expires_on, received_at + Duration::seconds(DEFAULT_EXPIRATION_TIME_SECS));
    }

    #[test]
    fn unrecognized_shapes_yield_none() {
        assert_eq!(classify(&[]).0, None);
        assert_eq!(classify(&[("token_type", "Bearer")]).0, None);
        assert_eq!(classify(&[("id_token", "")]).0, None);
    }

    #[test]
    fn shape_priority_is_deterministic() {
        assert_eq!(ResponseShape::of(&map(&[("code", "C"), ("id_token", "x")])), ResponseShape::IdTokenOnly);
        assert_eq!(ResponseShape::of(&map(&[("error", "e"), ("code", "C")])), ResponseShape::Error);
        assert_eq!(ResponseShape::of(&map(&[("state", "s")])), ResponseShape::Unrecognized);
    }
}

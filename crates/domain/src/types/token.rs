//! Token exchange outcomes
//!
//! A response from either the authorization redirect or the token endpoint is
//! classified into exactly one [`TokenResult`] variant. Protocol errors are
//! data, not Rust errors: the server answered correctly, it just said no.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::user::UserInfo;

/// The credential a success result is primarily about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PrimaryToken {
    AccessToken(String),
    /// ID-token-only responses (implicit `id_token` flow).
    IdToken(String),
}

impl PrimaryToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AccessToken(token) | Self::IdToken(token) => token,
        }
    }
}

/// Successful token issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSuccess {
    pub token: PrimaryToken,
    pub refresh_token: Option<String>,
    /// Receipt moment plus the relative lifetime the server granted.
    pub expires_on: DateTime<Utc>,
    pub extended_expires_on: Option<DateTime<Utc>>,
    pub is_multi_resource_refresh_token: bool,
    pub user_info: Option<UserInfo>,
    pub tenant_id: Option<String>,
    pub raw_id_token: Option<String>,
    pub family_client_id: Option<String>,
}

impl TokenSuccess {
    /// The access token, if this result carries one.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        match &self.token {
            PrimaryToken::AccessToken(token) => Some(token),
            PrimaryToken::IdToken(_) => None,
        }
    }
}

/// A well-formed OAuth error reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolError {
    pub code: String,
    pub description: Option<String>,
    /// Server-specific numeric codes (AAD `error_codes`), kept as strings.
    pub error_codes: Vec<String>,
}

/// Classified outcome of one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenResult {
    Success(TokenSuccess),
    ProtocolError(ProtocolError),
    /// Intermediate result of the code flow; never returned to callers of
    /// the engine's high-level operations.
    AuthorizationCode { code: String },
}

impl TokenResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn as_success(&self) -> Option<&TokenSuccess> {
        match self {
            Self::Success(success) => Some(success),
            _ => None,
        }
    }

    /// OAuth error code, for protocol errors.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::ProtocolError(error) => Some(&error.code),
            _ => None,
        }
    }

    /// Server error codes, for protocol errors.
    #[must_use]
    pub fn error_codes(&self) -> Option<&[String]> {
        match self {
            Self::ProtocolError(error) => Some(&error.error_codes),
            _ => None,
        }
    }

    #[must_use]
    pub fn authorization_code(&self) -> Option<&str> {
        match self {
            Self::AuthorizationCode { code } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success() -> TokenSuccess {
        TokenSuccess {
            token: PrimaryToken::AccessToken("AT".into()),
            refresh_token: None,
            expires_on: Utc::now(),
            extended_expires_on: None,
            is_multi_resource_refresh_token: false,
            user_info: None,
            tenant_id: None,
            raw_id_token: None,
            family_client_id: None,
        }
    }

    #[test]
    fn accessors_match_variant() {
        let ok = TokenResult::Success(success());
        assert!(ok.is_success());
        assert_eq!(ok.as_success().and_then(TokenSuccess::access_token), Some("AT"));
        assert_eq!(ok.error_code(), None);

        let err = TokenResult::ProtocolError(ProtocolError {
            code: "invalid_grant".into(),
            description: None,
            error_codes: vec!["70008".into()],
        });
        assert_eq!(err.error_code(), Some("invalid_grant"));
        assert_eq!(err.error_codes(), Some(&["70008".to_string()][..]));

        let code = TokenResult::AuthorizationCode { code: "C1".into() };
        assert_eq!(code.authorization_code(), Some("C1"));
    }

    #[test]
    fn id_token_primary_has_no_access_token() {
        let mut result = success();
        result.token = PrimaryToken::IdToken("ID".into());
        assert_eq!(result.access_token(), None);
        assert_eq!(result.token.as_str(), "ID");
    }

    #[test]
    fn serializes_with_type_tag() {
        let code = TokenResult::AuthorizationCode { code: "C1".into() };
        let json = serde_json::to_value(&code).unwrap();
        assert_eq!(json["type"], "authorization_code");
        assert_eq!(json["code"], "C1");
    }
}

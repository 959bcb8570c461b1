//! User identity types
//!
//! `UserInfo` is only ever built from a parsed ID token. There is no
//! `Default` impl so an empty identity cannot be fabricated by accident.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_protocol_value_conversions;
use crate::types::id_token::IdToken;

/// How the request's user hint should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIdentifierKind {
    #[default]
    None,
    LoginHint,
    UniqueId,
}

impl_protocol_value_conversions!(UserIdentifierKind {
    None => "none",
    LoginHint => "login_hint",
    UniqueId => "unique_id",
});

/// Identity of the signed-in user, derived from an ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Stable identifier: the object id, falling back to the subject.
    pub unique_id: Option<String>,
    /// Human readable id: UPN, falling back to email then unique name.
    pub displayable_id: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    /// Identity provider, falling back to the issuer.
    pub identity_provider: Option<String>,
    pub password_change_url: Option<String>,
    pub password_expires_on: Option<DateTime<Utc>>,
}

impl UserInfo {
    /// Derive user info from ID token claims.
    ///
    /// `received_at` anchors the relative `pwd_exp` claim.
    #[must_use]
    pub fn from_id_token(token: &IdToken, received_at: DateTime<Utc>) -> Self {
        let password_expires_on = token
            .password_expiration
            .filter(|secs| *secs > 0)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| received_at.checked_add_signed(lifetime));

        Self {
            unique_id: token.object_id.clone().or_else(|| token.subject.clone()),
            displayable_id: token
                .upn
                .clone()
                .or_else(|| token.email.clone())
                .or_else(|| token.unique_name.clone()),
            given_name: token.given_name.clone(),
            family_name: token.family_name.clone(),
            identity_provider: token
                .identity_provider
                .clone()
                .or_else(|| token.issuer.clone()),
            password_change_url: token.password_change_url.clone(),
            password_expires_on,
        }
    }
}

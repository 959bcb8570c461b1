//! Unverified ID token claim extraction
//!
//! The engine never makes trust decisions from these claims; they only
//! populate `UserInfo` and the tenant id for the caller. Signature validation,
//! when needed, is the caller's business.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::claims;
use crate::errors::IdTokenError;

/// Claims read from the payload segment of a JWT-shaped ID token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdToken {
    pub subject: Option<String>,
    pub tenant_id: Option<String>,
    pub upn: Option<String>,
    pub email: Option<String>,
    pub unique_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub identity_provider: Option<String>,
    pub issuer: Option<String>,
    pub object_id: Option<String>,
    /// Seconds until the password expires, as sent by the server.
    pub password_expiration: Option<i64>,
    pub password_change_url: Option<String>,
    pub expiration: Option<i64>,
    pub issued_at: Option<i64>,
}

impl IdToken {
    /// Decode the payload of `raw` without verifying its signature.
    ///
    /// # Errors
    /// Returns [`IdTokenError`] when the token is blank, has fewer than two
    /// dot-separated segments, or its payload is not base64url-encoded JSON.
    pub fn parse(raw: &str) -> Result<Self, IdTokenError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IdTokenError::Blank);
        }

        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() < 2 {
            return Err(IdTokenError::Segments(segments.len()));
        }

        let payload = segments[1];
        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .or_else(|_| URL_SAFE.decode(payload))
            .map_err(|err| IdTokenError::Encoding(err.to_string()))?;

        let claims_map: Map<String, Value> =
            serde_json::from_slice(&bytes).map_err(|err| IdTokenError::Json(err.to_string()))?;

        Ok(Self::from_claims(&claims_map))
    }

    fn from_claims(map: &Map<String, Value>) -> Self {
        Self {
            subject: string_claim(map, claims::SUBJECT),
            tenant_id: string_claim(map, claims::TENANT_ID),
            upn: string_claim(map, claims::UPN),
            email: string_claim(map, claims::EMAIL),
            unique_name: string_claim(map, claims::UNIQUE_NAME),
            given_name: string_claim(map, claims::GIVEN_NAME),
            family_name: string_claim(map, claims::FAMILY_NAME),
            identity_provider: string_claim(map, claims::IDENTITY_PROVIDER),
            issuer: string_claim(map, claims::ISSUER),
            object_id: string_claim(map, claims::OBJECT_ID),
            password_expiration: int_claim(map, claims::PASSWORD_EXPIRATION),
            password_change_url: string_claim(map, claims::PASSWORD_CHANGE_URL),
            expiration: int_claim(map, claims::EXPIRATION),
            issued_at: int_claim(map, claims::ISSUED_AT),
        }
    }

    /// Token lifetime in seconds (`exp - iat`), if both claims are present
    /// and the difference is positive.
    #[must_use]
    pub fn lifetime_secs(&self) -> Option<i64> {
        match (self.expiration, self.issued_at) {
            (Some(exp), Some(iat)) => exp.checked_sub(iat).filter(|secs| *secs > 0),
            _ => None,
        }
    }
}

fn string_claim(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn int_claim(map: &Map<String, Value>, key: &str) -> Option<i64> {
    match map.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

//! CSRF state parameter
//!
//! The `state` value carried through the authorization redirect is the
//! unpadded base64url encoding of `a=<authority>&r=<resource>`. On return it
//! must decode and name the same resource as the request, otherwise the
//! redirect belongs to some other attempt and is rejected.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tracing::warn;
use url::form_urlencoded;

use crate::error::{AuthError, AuthResult};
use crate::request::RequestContext;

const AUTHORITY_KEY: &str = "a";
const RESOURCE_KEY: &str = "r";

/// Decoded contents of the `state` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolState {
    pub authority: String,
    pub resource: String,
}

impl ProtocolState {
    pub fn new(authority: impl Into<String>, resource: impl Into<String>) -> Self {
        Self { authority: authority.into(), resource: resource.into() }
    }

    /// State for `context`.
    pub fn for_request(context: &RequestContext) -> Self {
        Self::new(context.authority(), context.resource())
    }

    /// Encode as the opaque `state` parameter value.
    pub fn encode(&self) -> String {
        let payload = form_urlencoded::Serializer::new(String::new())
            .append_pair(AUTHORITY_KEY, &self.authority)
            .append_pair(RESOURCE_KEY, &self.resource)
            .finish();
        URL_SAFE_NO_PAD.encode(payload)
    }

    /// Decode a returned `state` parameter.
    ///
    /// # Errors
    /// [`AuthError::NoState`] for a blank value, [`AuthError::BadState`] when
    /// the value does not decode to an authority/resource payload.
    pub fn decode(encoded: &str) -> AuthResult<Self> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(AuthError::NoState);
        }

        let bytes = URL_SAFE_NO_PAD.decode(encoded).map_err(|err| {
            warn!(error = %err, "state parameter is not base64url");
            AuthError::BadState
        })?;
        let payload = String::from_utf8(bytes).map_err(|_| {
            warn!("state parameter payload is not UTF-8");
            AuthError::BadState
        })?;

        let mut authority = None;
        let mut resource = None;
        for (key, value) in form_urlencoded::parse(payload.as_bytes()) {
            match key.as_ref() {
                AUTHORITY_KEY => authority = Some(value.into_owned()),
                RESOURCE_KEY => resource = Some(value.into_owned()),
                _ => {}
            }
        }

        match (authority, resource) {
            (Some(authority), Some(resource)) if !authority.trim().is_empty() => {
                Ok(Self { authority, resource })
            }
            _ => {
                warn!("state parameter payload is missing authority or resource");
                Err(AuthError::BadState)
            }
        }
    }

    /// Check that this state was issued for `context`.
    ///
    /// # Errors
    /// [`AuthError::BadState`] when the resource differs, ignoring Unicode
    /// case.
    pub fn validate_for(&self, context: &RequestContext) -> AuthResult<()> {
        if self.resource.to_lowercase() == context.resource().to_lowercase() {
            Ok(())
        } else {
            warn!(
                correlation_id = %context.correlation_id(),
                "state resource does not match the request resource"
            );
            Err(AuthError::BadState)
        }
    }
}

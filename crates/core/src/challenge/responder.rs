//! PKeyAuth challenge responses

use std::sync::Arc;

use oidcflow_domain::constants::pkeyauth;
use tracing::{debug, info};

use crate::challenge::parser::{parse_challenge, DeviceChallenge};
use crate::error::{AuthError, AuthResult};
use crate::signing_ports::JwsSigner;

/// Authorization header value answering a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeResponse {
    pub authorization: String,
    /// Whether a signed device assertion is included.
    pub signed: bool,
}

/// Computes responses to device certificate challenges.
#[derive(Clone, Default)]
pub struct ChallengeResponder {
    signer: Option<Arc<dyn JwsSigner>>,
}

impl std::fmt::Debug for ChallengeResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeResponder").field("has_signer", &self.signer.is_some()).finish()
    }
}

impl ChallengeResponder {
    pub fn new(signer: Option<Arc<dyn JwsSigner>>) -> Self {
        Self { signer }
    }

    /// Answer `header` for a POST to `target_url`.
    ///
    /// Without a signer, or when the signer's certificate does not match the
    /// challenge, the response carries only the echoed context and version.
    ///
    /// # Errors
    /// [`AuthError::DeviceCertificateRequestInvalid`] when the header is
    /// malformed or signing fails.
    pub fn respond(&self, header: &str, target_url: &str) -> AuthResult<ChallengeResponse> {
        let challenge = parse_challenge(header)?;
        debug!(
            version = %challenge.version,
            authorities = challenge.cert_authorities.len(),
            "received device certificate challenge"
        );

        match self.signer.as_deref().filter(|signer| signer.accepts(&challenge)) {
            Some(signer) => {
                let token = signer
                    .sign(&challenge.nonce, target_url)
                    .map_err(|err| AuthError::DeviceCertificateRequestInvalid(err.to_string()))?;
                info!("answering device certificate challenge with a signed assertion");
                Ok(ChallengeResponse { authorization: signed_response(&token, &challenge), signed: true })
            }
            None => {
                info!("no matching device certificate; answering challenge unsigned");
                Ok(ChallengeResponse { authorization: unsigned_response(&challenge), signed: false })
            }
        }
    }
}

fn signed_response(token: &str, challenge: &DeviceChallenge) -> String {
    format!(
        r#"{} AuthToken="{token}",Context="{}",Version="{}""#,
        pkeyauth::CHALLENGE_RESPONSE_TYPE,
        challenge.context,
        challenge.version
    )
}

fn unsigned_response(challenge: &DeviceChallenge) -> String {
    format!(
        r#"{} Context="{}",Version="{}""#,
        pkeyauth::CHALLENGE_RESPONSE_TYPE,
        challenge.context,
        challenge.version
    )
}

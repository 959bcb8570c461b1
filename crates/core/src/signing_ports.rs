//! Device certificate signing port - JWS builder used for PKeyAuth

use std::time::Duration;

use oidcflow_common::{ErrorClassification, ErrorSeverity};
use thiserror::Error;

use crate::challenge::DeviceChallenge;

/// Signing failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("signing key is unusable: {0}")]
    Key(String),

    #[error("failed to sign assertion: {0}")]
    Sign(String),
}

impl ErrorClassification for SigningError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Port trait for the device-certificate JWS builder
///
/// One implementation wraps one device certificate and its private key.
pub trait JwsSigner: Send + Sync {
    /// Whether this certificate satisfies the challenge's issuer or
    /// thumbprint constraint.
    fn accepts(&self, challenge: &DeviceChallenge) -> bool;

    /// Sign an assertion over `nonce` for `audience` (the token endpoint).
    fn sign(&self, nonce: &str, audience: &str) -> Result<String, SigningError>;
}

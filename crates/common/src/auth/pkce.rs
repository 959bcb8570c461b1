//! PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
//!
//! Implements RFC 7636 `S256` challenges. The verifier is 32 random bytes
//! rendered as URL-safe base64 without padding (43 characters).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes backing a code verifier.
pub const VERIFIER_ENTROPY_BYTES: usize = 32;

/// The only challenge method this crate emits.
pub const CHALLENGE_METHOD_S256: &str = "S256";

/// Generate a cryptographically secure code verifier
///
/// Returns a URL-safe base64-encoded random string of 32 bytes (43 characters).
/// Per RFC 7636, verifiers must be 43-128 characters long.
#[must_use]
pub fn generate_code_verifier() -> String {
    let mut random_bytes = [0u8; VERIFIER_ENTROPY_BYTES];
    rand::thread_rng().fill_bytes(&mut random_bytes);
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Generate code challenge from verifier using SHA256
///
/// Per RFC 7636, the challenge is BASE64URL(SHA256(ASCII(code_verifier)))
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    URL_SAFE_NO_PAD.encode(hash)
}

/// Verifier/challenge pair bound together for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkcePair {
    /// Random secret, sent only with the code exchange.
    pub code_verifier: String,

    /// SHA256 of `code_verifier`, sent with the authorization request.
    pub code_challenge: String,
}

impl PkcePair {
    /// Generate a fresh pair.
    ///
    /// # Examples
    /// ```
    /// use oidcflow_common::auth::pkce::PkcePair;
    ///
    /// let pair = PkcePair::generate();
    /// assert_eq!(pair.code_verifier.len(), 43);
    /// assert!(pair.matches());
    /// ```
    #[must_use]
    pub fn generate() -> Self {
        Self::from_verifier(generate_code_verifier())
    }

    /// Build the pair for an existing verifier.
    #[must_use]
    pub fn from_verifier(code_verifier: String) -> Self {
        let code_challenge = generate_code_challenge(&code_verifier);
        Self { code_verifier, code_challenge }
    }

    /// Get the challenge method (always "S256" for SHA256)
    #[must_use]
    pub fn challenge_method(&self) -> &'static str {
        CHALLENGE_METHOD_S256
    }

    /// Recompute the challenge and compare it with the stored one.
    #[must_use]
    pub fn matches(&self) -> bool {
        generate_code_challenge(&self.code_verifier) == self.code_challenge
    }
}

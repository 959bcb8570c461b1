use std::fmt;
use std::io::Cursor;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use oidcflow_core::{DeviceChallenge, JwsSigner, SigningError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Claims of a PKeyAuth device assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAssertionClaims {
    pub aud: String,
    pub nonce: String,
    pub iat: i64,
}

/// RS256 [`JwsSigner`] over one device certificate.
///
/// The certificate travels in the `x5c` header; its SHA-256 thumbprint is
/// what `CertThumbprint` challenges are matched against.
pub struct DeviceCertificateSigner {
    key: EncodingKey,
    certificate_der: Vec<u8>,
    issuer: String,
    thumbprint: String,
}

impl fmt::Debug for DeviceCertificateSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCertificateSigner")
            .field("issuer", &self.issuer)
            .field("thumbprint", &self.thumbprint)
            .finish_non_exhaustive()
    }
}

impl DeviceCertificateSigner {
    /// Build a signer from a PEM RSA private key, the PEM certificate, and
    /// the certificate issuer DN as reported by the certificate store.
    ///
    /// # Errors
    /// [`SigningError::Key`] when the key or certificate cannot be read.
    pub fn from_pem(
        private_key_pem: &[u8],
        certificate_pem: &str,
        issuer: impl Into<String>,
    ) -> Result<Self, SigningError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem)
            .map_err(|err| SigningError::Key(err.to_string()))?;
        let certificate_der = certificate_der(certificate_pem)?;
        let thumbprint = hex::encode_upper(Sha256::digest(&certificate_der));

        Ok(Self { key, certificate_der, issuer: issuer.into(), thumbprint })
    }

    /// Upper-case hex SHA-256 of the DER certificate.
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

impl JwsSigner for DeviceCertificateSigner {
    fn accepts(&self, challenge: &DeviceChallenge) -> bool {
        if !challenge.cert_authorities.is_empty() {
            let issuer = normalize_dn(&self.issuer);
            let accepted =
                challenge.cert_authorities.iter().any(|authority| normalize_dn(authority) == issuer);
            debug!(accepted, "matched device certificate issuer against challenge");
            return accepted;
        }

        match &challenge.cert_thumbprint {
            Some(thumbprint) => {
                let wanted: String = thumbprint.chars().filter(|c| *c != ':').collect();
                wanted.eq_ignore_ascii_case(&self.thumbprint)
            }
            None => false,
        }
    }

    fn sign(&self, nonce: &str, audience: &str) -> Result<String, SigningError> {
        let mut header = Header::new(Algorithm::RS256);
        header.x5c = Some(vec![STANDARD.encode(&self.certificate_der)]);
        header.x5t_s256 =
            Some(URL_SAFE_NO_PAD.encode(Sha256::digest(&self.certificate_der)));

        let claims = DeviceAssertionClaims {
            aud: audience.to_string(),
            nonce: nonce.to_string(),
            iat: Utc::now().timestamp(),
        };

        encode(&header, &claims, &self.key).map_err(|err| SigningError::Sign(err.to_string()))
    }
}

/// DER bytes of the leaf (first) certificate in a PEM bundle.
fn certificate_der(pem: &str) -> Result<Vec<u8>, SigningError> {
    let mut reader = Cursor::new(pem.as_bytes());
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| SigningError::Key(format!("invalid PEM certificate: {err}")))?;

    certs
        .into_iter()
        .next()
        .map(|cert| cert.as_ref().to_vec())
        .ok_or_else(|| SigningError::Key("no PEM certificate block found".into()))
}

/// Lower-cased DN with whitespace around `,` and `=` removed.
fn normalize_dn(dn: &str) -> String {
    dn.split(',')
        .map(|rdn| {
            rdn.split('=').map(str::trim).collect::<Vec<_>>().join("=").to_ascii_lowercase()
        })
        .collect::<Vec<_>>()
        .join(",")
}

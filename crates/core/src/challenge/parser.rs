//! PKeyAuth challenge header parsing
//!
//! Header shape: `PKeyAuth Key="value", Key2="value2"`. Parameter names are
//! case-insensitive. Quoted values may contain commas (certificate authority
//! DNs do), so values are read quote-aware rather than split on `,`.

use std::collections::HashMap;

use oidcflow_domain::constants::pkeyauth;

use crate::error::{AuthError, AuthResult};

/// Parameters of a device certificate challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceChallenge {
    pub nonce: String,
    pub context: String,
    pub version: String,
    /// Accepted certificate issuer DNs, from `CertAuthorities` (`;` separated).
    pub cert_authorities: Vec<String>,
    pub cert_thumbprint: Option<String>,
}

/// Whether `header` uses the PKeyAuth scheme.
pub fn is_pkeyauth_challenge(header: &str) -> bool {
    let header = header.trim_start();
    let scheme = pkeyauth::CHALLENGE_RESPONSE_TYPE;
    header.len() >= scheme.len()
        && header.is_char_boundary(scheme.len())
        && header[..scheme.len()].eq_ignore_ascii_case(scheme)
        && header[scheme.len()..].chars().next().map_or(true, char::is_whitespace)
}

/// Parse a PKeyAuth challenge header.
///
/// # Errors
/// [`AuthError::DeviceCertificateRequestInvalid`] when the scheme is not
/// PKeyAuth, the parameter list is malformed, or `nonce`, `context` or
/// `version` is missing.
pub fn parse_challenge(header: &str) -> AuthResult<DeviceChallenge> {
    if !is_pkeyauth_challenge(header) {
        return Err(invalid("not a PKeyAuth challenge"));
    }
    let parameters = &header.trim_start()[pkeyauth::CHALLENGE_RESPONSE_TYPE.len()..];
    let mut params = parse_parameters(parameters).map_err(invalid)?;

    let mut required = |key: &str| {
        params
            .remove(key)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| invalid(format!("challenge is missing '{key}'")))
    };
    let nonce = required(pkeyauth::NONCE)?;
    let context = required(pkeyauth::CONTEXT)?;
    let version = required(pkeyauth::VERSION)?;

    let cert_authorities = params
        .get(pkeyauth::CERT_AUTHORITIES)
        .map(|raw| {
            raw.split(';')
                .map(str::trim)
                .filter(|dn| !dn.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let cert_thumbprint = params
        .remove(pkeyauth::CERT_THUMBPRINT)
        .filter(|value| !value.trim().is_empty());

    Ok(DeviceChallenge { nonce, context, version, cert_authorities, cert_thumbprint })
}

fn parse_parameters(input: &str) -> Result<HashMap<String, String>, String> {
    let mut params = HashMap::new();
    let mut rest = input.trim();

    while !rest.is_empty() {
        let eq = rest.find('=').ok_or("parameter without a value")?;
        let key = rest[..eq].trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err("parameter without a name".into());
        }

        let after = rest[eq + 1..].trim_start();
        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            let end = quoted.find('"').ok_or("unterminated quoted value")?;
            (&quoted[..end], &quoted[end + 1..])
        } else {
            let end = after.find(',').unwrap_or(after.len());
            (after[..end].trim(), &after[end..])
        };
        params.insert(key, value.to_string());

        rest = remainder.trim_start();
        if let Some(next) = rest.strip_prefix(',') {
            rest = next.trim_start();
        } else if !rest.is_empty() {
            return Err("expected ',' between parameters".into());
        }
    }

    Ok(params)
}

fn invalid(reason: impl Into<String>) -> AuthError {
    AuthError::DeviceCertificateRequestInvalid(reason.into())
}

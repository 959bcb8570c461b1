//! Authorization redirect parameter extraction

use std::collections::HashMap;

use url::{form_urlencoded, Url};

use crate::error::{AuthError, AuthResult};

/// Collect the parameters of a final redirect URL.
///
/// Both the query string and the fragment are read, since implicit-flow
/// responses arrive in the fragment. Query values win on duplicate keys.
///
/// # Errors
/// [`AuthError::InvalidRequest`] when the URL is blank or does not parse.
pub fn redirect_parameters(redirect_url: &str) -> AuthResult<HashMap<String, String>> {
    let redirect_url = redirect_url.trim();
    if redirect_url.is_empty() {
        return Err(AuthError::InvalidRequest("redirect URL is blank".into()));
    }

    let url = Url::parse(redirect_url)
        .map_err(|err| AuthError::InvalidRequest(format!("redirect URL does not parse: {err}")))?;

    let mut params: HashMap<String, String> = url
        .fragment()
        .map(|fragment| form_urlencoded::parse(fragment.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    params.extend(url.query_pairs().into_owned());
    Ok(params)
}

//! Protocol constants
//!
//! Centralized location for OAuth2/OIDC parameter names, HTTP header names,
//! and defaults used throughout the engine.

// Token lifetime
pub const DEFAULT_EXPIRATION_TIME_SECS: i64 = 3600;

// Endpoint derivation
pub const DEFAULT_ENDPOINT_FRAGMENT: &str = "/connect";
pub const AUTHORIZE_ENDPOINT_SUFFIX: &str = "/authorize";
pub const TOKEN_ENDPOINT_SUFFIX: &str = "/token";
pub const SECURE_REDIRECT_PREFIX: &str = "https://";

// Response types
pub const RESPONSE_TYPE_ID_TOKEN: &str = "id_token";
pub const RESPONSE_TYPE_CODE_PREFIX: &str = "code";

/// OAuth2 request/response parameter names.
pub mod oauth2 {
    pub const RESPONSE_TYPE: &str = "response_type";
    pub const CLIENT_ID: &str = "client_id";
    pub const REDIRECT_URI: &str = "redirect_uri";
    pub const STATE: &str = "state";
    pub const NONCE: &str = "nonce";
    pub const CODE_CHALLENGE: &str = "code_challenge";
    pub const CODE_CHALLENGE_METHOD: &str = "code_challenge_method";
    pub const CODE_VERIFIER: &str = "code_verifier";
    pub const CLAIMS: &str = "claims";
    pub const LOGIN_HINT: &str = "login_hint";
    pub const GRANT_TYPE: &str = "grant_type";
    pub const AUTHORIZATION_CODE: &str = "authorization_code";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const CODE: &str = "code";
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const ID_TOKEN: &str = "id_token";
    pub const EXPIRES_IN: &str = "expires_in";
    pub const EXT_EXPIRES_IN: &str = "ext_expires_in";
    pub const ERROR: &str = "error";
    pub const ERROR_DESCRIPTION: &str = "error_description";
    pub const ERROR_CODES: &str = "error_codes";
    pub const RESOURCE: &str = "resource";
    pub const CORRELATION_ID: &str = "correlation_id";
    pub const FAMILY_CLIENT_ID: &str = "foci";
}

/// HTTP header names and values exchanged with the token endpoint.
pub mod headers {
    pub const ACCEPT: &str = "Accept";
    pub const ACCEPT_JSON: &str = "application/json";
    pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
    pub const CLIENT_REQUEST_ID: &str = "client-request-id";
    pub const RETURN_CLIENT_REQUEST_ID: &str = "return-client-request-id";
    pub const REQUEST_ID: &str = "x-ms-request-id";
}

/// Device-certificate (PKeyAuth) challenge sub-protocol.
pub mod pkeyauth {
    pub const CHALLENGE_REQUEST_HEADER: &str = "WWW-Authenticate";
    pub const CHALLENGE_RESPONSE_HEADER: &str = "Authorization";
    pub const CHALLENGE_RESPONSE_TYPE: &str = "PKeyAuth";
    pub const TLS_INCAPABLE_HEADER: &str = "x-ms-PKeyAuth";
    pub const TLS_INCAPABLE_VERSION: &str = "1.0";
    pub const NONCE: &str = "nonce";
    pub const CONTEXT: &str = "context";
    pub const VERSION: &str = "version";
    pub const CERT_AUTHORITIES: &str = "certauthorities";
    pub const CERT_THUMBPRINT: &str = "certthumbprint";
}

// ID token claims
pub mod claims {
    pub const SUBJECT: &str = "sub";
    pub const TENANT_ID: &str = "tid";
    pub const UPN: &str = "upn";
    pub const EMAIL: &str = "email";
    pub const UNIQUE_NAME: &str = "unique_name";
    pub const GIVEN_NAME: &str = "given_name";
    pub const FAMILY_NAME: &str = "family_name";
    pub const IDENTITY_PROVIDER: &str = "idp";
    pub const ISSUER: &str = "iss";
    pub const OBJECT_ID: &str = "oid";
    pub const PASSWORD_EXPIRATION: &str = "pwd_exp";
    pub const PASSWORD_CHANGE_URL: &str = "pwd_url";
    pub const EXPIRATION: &str = "exp";
    pub const ISSUED_AT: &str = "iat";
}

// Telemetry
pub const HTTP_EVENT: &str = "http_event";
pub const HTTP_METHOD_POST: &str = "POST";

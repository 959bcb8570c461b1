//! OAuth 2.0 cryptographic helpers
//!
//! Only the pieces that are independent of any particular request live here.
//! Request-scoped state (which verifier belongs to which attempt) is owned by
//! `oidcflow-core`.

pub mod pkce;

pub use pkce::{generate_code_challenge, generate_code_verifier, PkcePair};

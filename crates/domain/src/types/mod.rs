//! Domain types and models
//!
//! Outcomes of a token exchange plus the identity data derived from ID tokens.

pub mod id_token;
pub mod token;
pub mod user;

pub use id_token::IdToken;
pub use token::{PrimaryToken, ProtocolError, TokenResult, TokenSuccess};
pub use user::{UserIdentifierKind, UserInfo};

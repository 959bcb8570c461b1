//! Device certificate (PKeyAuth) challenge sub-protocol

pub mod parser;
pub mod responder;

pub use parser::{is_pkeyauth_challenge, parse_challenge, DeviceChallenge};
pub use responder::{ChallengeResponder, ChallengeResponse};

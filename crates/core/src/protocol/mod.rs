//! Protocol message construction
//!
//! Endpoint URLs, the authorization query, token request bodies, and the
//! CSRF `state` parameter. Nothing here performs I/O.

pub mod redirect;
pub mod state;
pub mod url_builder;

pub use redirect::redirect_parameters;
pub use state::ProtocolState;
pub use url_builder::ProtocolUrlBuilder;

//! # oidcflow Domain
//!
//! Protocol data types for the oidcflow token engine.
//!
//! This crate contains:
//! - Token exchange outcomes (`TokenResult` and its variants)
//! - Identity data derived from ID tokens (`IdToken`, `UserInfo`)
//! - Protocol constants (parameter names, header names, defaults)
//! - Engine configuration structures
//!
//! ## Architecture
//! - Depends only on the `foundation` tier of `oidcflow-common`
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;

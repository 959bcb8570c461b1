//! Configuration loading
//!
//! Reads [`oidcflow_domain::EngineConfig`] from environment variables and
//! TOML/JSON files.

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, probe_config_paths};

//! Configuration loader
//!
//! Loads engine configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If any `OIDCFLOW_*` variable is set, the environment wins
//! 2. Otherwise the first config file found is loaded
//! 3. With neither, defaults apply
//!
//! Every field is optional; missing values keep their defaults.
//!
//! ## Environment Variables
//! - `OIDCFLOW_CONNECT_TIMEOUT_MS`: TCP connect timeout
//! - `OIDCFLOW_READ_TIMEOUT_MS`: Response timeout
//! - `OIDCFLOW_USER_AGENT`: User agent for token POSTs
//! - `OIDCFLOW_RETRY_DELAY_MS`: Delay before the single timeout retry
//! - `OIDCFLOW_DEFAULT_EXPIRATION_SECS`: Token lifetime when the server omits one
//! - `OIDCFLOW_LOG_FILTER`: `tracing` filter directive
//! - `OIDCFLOW_LOG_JSON`: JSON log output (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./oidcflow.toml`, `./oidcflow.json`
//! 2. `./config.toml`, `./config.json`
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use oidcflow_domain::{ConfigError, ConfigResult, EngineConfig};

const ENV_CONNECT_TIMEOUT_MS: &str = "OIDCFLOW_CONNECT_TIMEOUT_MS";
const ENV_READ_TIMEOUT_MS: &str = "OIDCFLOW_READ_TIMEOUT_MS";
const ENV_USER_AGENT: &str = "OIDCFLOW_USER_AGENT";
const ENV_RETRY_DELAY_MS: &str = "OIDCFLOW_RETRY_DELAY_MS";
const ENV_DEFAULT_EXPIRATION_SECS: &str = "OIDCFLOW_DEFAULT_EXPIRATION_SECS";
const ENV_LOG_FILTER: &str = "OIDCFLOW_LOG_FILTER";
const ENV_LOG_JSON: &str = "OIDCFLOW_LOG_JSON";

const ENV_KEYS: [&str; 7] = [
    ENV_CONNECT_TIMEOUT_MS,
    ENV_READ_TIMEOUT_MS,
    ENV_USER_AGENT,
    ENV_RETRY_DELAY_MS,
    ENV_DEFAULT_EXPIRATION_SECS,
    ENV_LOG_FILTER,
    ENV_LOG_JSON,
];

const FILE_NAMES: [&str; 4] = ["oidcflow.toml", "oidcflow.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `ConfigError::Invalid` if the selected source holds an invalid
/// value or cannot be parsed.
pub fn load() -> ConfigResult<EngineConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(ConfigError::NotFound(reason)) => {
            tracing::debug!(%reason, "No environment configuration, trying file");
            match load_from_file(None) {
                Err(ConfigError::NotFound(reason)) => {
                    tracing::info!(%reason, "No configuration source found, using defaults");
                    Ok(EngineConfig::default())
                }
                other => other,
            }
        }
        Err(err) => Err(err),
    }
}

/// Load configuration from environment variables
///
/// Variables that are not set keep their default values.
///
/// # Errors
/// - `ConfigError::NotFound` when no `OIDCFLOW_*` variable is set
/// - `ConfigError::Invalid` when a variable has an invalid value
pub fn load_from_env() -> ConfigResult<EngineConfig> {
    if !ENV_KEYS.iter().any(|key| std::env::var_os(key).is_some()) {
        return Err(ConfigError::NotFound("no OIDCFLOW_* environment variables set".into()));
    }

    let mut config = EngineConfig::default();

    if let Some(value) = env_parse(ENV_CONNECT_TIMEOUT_MS)? {
        config.http.connect_timeout_ms = value;
    }
    if let Some(value) = env_parse(ENV_READ_TIMEOUT_MS)? {
        config.http.read_timeout_ms = value;
    }
    if let Ok(agent) = std::env::var(ENV_USER_AGENT) {
        config.http.user_agent = Some(agent).filter(|agent| !agent.trim().is_empty());
    }
    if let Some(value) = env_parse(ENV_RETRY_DELAY_MS)? {
        config.retry.timeout_retry_delay_ms = value;
    }
    if let Some(value) = env_parse(ENV_DEFAULT_EXPIRATION_SECS)? {
        config.tokens.default_expiration_secs = value;
    }
    if let Ok(filter) = std::env::var(ENV_LOG_FILTER) {
        config.logging.filter = filter;
    }
    config.logging.json = env_bool(ENV_LOG_JSON, config.logging.json);

    validate(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations (see
/// [`probe_config_paths`]). TOML and JSON are detected by extension.
///
/// # Errors
/// - `ConfigError::NotFound` when the file (or any probed file) is missing
/// - `ConfigError::Io` when the file cannot be read
/// - `ConfigError::Invalid` when parsing or validation fails
pub fn load_from_file(path: Option<PathBuf>) -> ConfigResult<EngineConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound(p.display().to_string()));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ConfigError::NotFound("no config file in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)?;
    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension.
fn parse_config(contents: &str, path: &Path) -> ConfigResult<EngineConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let config: EngineConfig = match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConfigError::Invalid(format!("Invalid TOML format: {e}")))?,
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConfigError::Invalid(format!("Invalid JSON format: {e}")))?,
        _ => return Err(ConfigError::Invalid(format!("Unsupported config format: {extension}"))),
    };

    validate(config)
}

/// First existing config file, probing the working directory and then the
/// executable's directory.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|candidate| candidate.is_file())
}

fn validate(config: EngineConfig) -> ConfigResult<EngineConfig> {
    if config.http.connect_timeout_ms == 0 || config.http.read_timeout_ms == 0 {
        return Err(ConfigError::Invalid("HTTP timeouts must be greater than zero".into()));
    }
    if config.tokens.default_expiration_secs <= 0 {
        return Err(ConfigError::Invalid("default_expiration_secs must be positive".into()));
    }
    Ok(config)
}

/// Parse an optional environment variable.
fn env_parse<T>(key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

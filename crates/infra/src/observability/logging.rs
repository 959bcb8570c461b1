//! Global `tracing` subscriber installation

use oidcflow_domain::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber described by `config`.
///
/// `RUST_LOG` overrides `config.filter`; an unparseable configured filter
/// falls back to `info`. Returns `false` when a global subscriber was
/// already installed, in which case nothing changes.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = build_filter(config);
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed =
        if config.json { builder.json().try_init().is_ok() } else { builder.try_init().is_ok() };

    if installed {
        tracing::debug!(json = config.json, "logging initialised");
    }
    installed
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

// File: src/logging.rs
// Purpose: tracing-subscriber setup

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Installs the global subscriber
///
/// `RUST_LOG` takes precedence over `config.level`. Fails if a subscriber is
/// already installed or the level is not a valid filter directive.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| anyhow!("invalid log level '{}': {}", config.level, e))?,
    };

    let builder = fmt().with_env_filter(filter).with_target(true);

    if config.json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow!("failed to install log subscriber: {}", e))
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow!("failed to install log subscriber: {}", e))
    }
}

//! Logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{ClientConfig, ConfigError};

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over [`ClientConfig::log_filter`].
pub fn init_tracing(config: &ClientConfig) -> Result<(), ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .map_err(|e| ConfigError::InvalidLogFilter(e.to_string()))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| ConfigError::LoggingInitialized(e.to_string()))
}

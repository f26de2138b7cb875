//! Client configuration.

use std::env;

use crate::AuthorizationType;

const DEFAULT_LOG_FILTER: &str = "syncql_client=debug";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Authorization type used when candidates are not rule-derived
    pub default_auth_type: AuthorizationType,
    /// Derive auth candidates from each model's rules
    pub multi_auth: bool,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_auth_type: AuthorizationType::ApiKey,
            multi_auth: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load a `.env` file if present, then read the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to read .env file");
            }
        }
        Self::from_env()
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_auth_type = match lookup("SYNCQL_AUTH_MODE") {
            Some(value) => match value.parse() {
                Ok(auth_type) => auth_type,
                Err(_) => return Err(ConfigError::InvalidAuthMode(value)),
            },
            None => AuthorizationType::ApiKey,
        };

        let multi_auth = match lookup("SYNCQL_MULTI_AUTH") {
            Some(value) => match parse_bool(&value) {
                Some(flag) => flag,
                None => return Err(ConfigError::InvalidMultiAuth(value)),
            },
            None => false,
        };

        let log_filter = lookup("SYNCQL_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            default_auth_type,
            multi_auth,
            log_filter,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid SYNCQL_AUTH_MODE value: {0}")]
    InvalidAuthMode(String),

    #[error("Invalid SYNCQL_MULTI_AUTH value: {0}")]
    InvalidMultiAuth(String),

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),

    #[error("Logging already initialized: {0}")]
    LoggingInitialized(String),
}

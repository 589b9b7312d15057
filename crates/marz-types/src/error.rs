//! Error types for configuration loading.

use thiserror::Error;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layered configuration could not be built or deserialized
    #[error("Configuration error: {0}")]
    Load(String),

    /// A loaded value is out of range
    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl From<::config::ConfigError> for ConfigError {
    fn from(err: ::config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

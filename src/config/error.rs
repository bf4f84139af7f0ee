//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("API base URL must use http:// or https://")]
    InvalidApiUrl,

    #[error("Live URL must use ws:// or wss://")]
    InvalidWsUrl,

    #[error("Duration '{0}' must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("Stability threshold must be at least 1")]
    InvalidStabilityThreshold,

    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),
}

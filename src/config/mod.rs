//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `WALLET_SYNC` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use wallet_sync::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Polling every {:?}", config.sync.poll_interval());
//! ```

mod endpoints;
mod error;
mod sync;
mod telemetry;

pub use endpoints::EndpointsConfig;
pub use error::{ConfigError, ValidationError};
pub use sync::SyncConfig;
pub use telemetry::TelemetryConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Push channel, poller and reconnect timing
    #[serde(default)]
    pub sync: SyncConfig,

    /// Account API and live channel URLs
    pub endpoints: EndpointsConfig,

    /// Log level and format
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `WALLET_SYNC` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `WALLET_SYNC__SYNC__POLL_INTERVAL_MS=10000` -> `sync.poll_interval_ms = 10000`
    /// - `WALLET_SYNC__ENDPOINTS__WS_URL=wss://...` -> `endpoints.ws_url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("WALLET_SYNC")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section that is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.sync.validate()?;
        self.endpoints.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

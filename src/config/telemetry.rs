//! Logging configuration

use serde::Deserialize;

use super::error::ValidationError;

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log output settings
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Default filter when `RUST_LOG` is not set, e.g. `info` or
    /// `wallet_sync=debug,info`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl TelemetryConfig {
    /// Validate telemetry configuration
    ///
    /// Only the bare-level form is checked; directive lists are left to
    /// `EnvFilter`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let level = self.log_level.trim().to_lowercase();
        if level.is_empty() {
            return Err(ValidationError::MissingRequired("TELEMETRY__LOG_LEVEL"));
        }
        let is_directive_list = level.contains('=') || level.contains(',');
        if !is_directive_list && !LEVELS.contains(&level.as_str()) {
            return Err(ValidationError::InvalidLogLevel(self.log_level.clone()));
        }
        Ok(())
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

//! Live update timing configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::sync::SupervisorConfig;

/// Timing of the push channel, its fallback poller, and reconnection
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// How long the primary channel may take before polling starts
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// Interval between fallback polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay before each reconnect attempt
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Consecutive primary messages before the poller is stopped
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: u32,
}

impl SyncConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Supervisor settings derived from this section
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig::default()
            .with_grace_period(self.grace_period())
            .with_poll_interval(self.poll_interval())
            .with_reconnect_delay(self.reconnect_delay())
            .with_stability_threshold(self.stability_threshold)
    }

    /// Validate sync configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.grace_period_ms == 0 {
            return Err(ValidationError::ZeroDuration("grace_period_ms"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::ZeroDuration("poll_interval_ms"));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ValidationError::ZeroDuration("reconnect_delay_ms"));
        }
        if self.stability_threshold == 0 {
            return Err(ValidationError::InvalidStabilityThreshold);
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: default_grace_period_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            stability_threshold: default_stability_threshold(),
        }
    }
}

fn default_grace_period_ms() -> u64 {
    3_000
}

fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_reconnect_delay_ms() -> u64 {
    5_000
}

fn default_stability_threshold() -> u32 {
    3
}

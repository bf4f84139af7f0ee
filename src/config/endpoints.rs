//! Account API and live channel endpoints

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where the account API and the live channel are reached
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    /// REST base URL, e.g. `https://api.example.com/v1`
    pub api_base_url: String,

    /// Live channel base URL, e.g. `wss://live.example.com`
    pub ws_url: String,

    /// Bearer token for both channels; usually replaced at runtime
    #[serde(default)]
    pub access_token: Option<SecretString>,

    /// HTTP request and WebSocket connect timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl EndpointsConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate endpoint configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_base_url.is_empty() {
            return Err(ValidationError::MissingRequired("ENDPOINTS__API_BASE_URL"));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidApiUrl);
        }
        if self.ws_url.is_empty() {
            return Err(ValidationError::MissingRequired("ENDPOINTS__WS_URL"));
        }
        if !self.ws_url.starts_with("ws://") && !self.ws_url.starts_with("wss://") {
            return Err(ValidationError::InvalidWsUrl);
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            ws_url: String::new(),
            access_token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    10
}

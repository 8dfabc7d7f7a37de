//! Remote endpoint configuration.

use std::time::Duration;

use anyhow::{Context, Result};

/// Where the two services live (env-driven).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Device service base URL (example: http://localhost:8090).
    pub device_service_url: String,

    /// Management service base URL (example: http://localhost:8080).
    pub management_service_url: String,

    /// Optional bearer token for the management service.
    pub management_token: Option<String>,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            device_service_url: "http://localhost:8090".to_string(),
            management_service_url: "http://localhost:8080".to_string(),
            management_token: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RemoteConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let device_service_url = std::env::var("LABSYNC_DEVICE_SERVICE_URL")
            .unwrap_or(defaults.device_service_url);

        let management_service_url = std::env::var("LABSYNC_MANAGEMENT_SERVICE_URL")
            .unwrap_or(defaults.management_service_url);

        let management_token = std::env::var("LABSYNC_MANAGEMENT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let request_timeout_secs: u64 = std::env::var("LABSYNC_REQUEST_TIMEOUT_SECS")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("LABSYNC_REQUEST_TIMEOUT_SECS must be an integer (seconds).")?
            .unwrap_or(defaults.request_timeout.as_secs());

        Ok(Self {
            device_service_url,
            management_service_url,
            management_token,
            request_timeout: Duration::from_secs(request_timeout_secs.max(1)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = RemoteConfig::default();
        assert!(!config.device_service_url.is_empty());
        assert_ne!(config.device_service_url, config.management_service_url);
        assert!(config.management_token.is_none());
    }
}

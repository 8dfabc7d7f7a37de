//! CLI configuration.
//!
//! An optional `config.json` in the platform config directory overrides the
//! built-in endpoint defaults. Flags (and their environment variables) win
//! over the file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use labsync_remote::RemoteConfig;
use serde::{Deserialize, Serialize};

/// Configuration file name.
const CONFIG_FILE: &str = "config.json";

/// Get the config directory path.
fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("dev", "labsync", "labctl")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_service_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_service_url: Option<String>,

    /// Used when `LABSYNC_MANAGEMENT_TOKEN` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_token: Option<String>,

    /// Log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load config from disk, or return default.
    pub fn load() -> Result<Self> {
        let path = config_dir()?.join(CONFIG_FILE);

        if !path.exists() {
            return Ok(Self {
                log_level: default_log_level(),
                ..Self::default()
            });
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Resolve remote endpoints: flag or env, then this file, then defaults.
    pub fn remote_config(
        &self,
        device_url: Option<String>,
        management_url: Option<String>,
    ) -> Result<RemoteConfig> {
        let mut remote = RemoteConfig::from_env()?;

        if let Some(url) = device_url.or_else(|| self.device_service_url.clone()) {
            remote.device_service_url = url;
        }
        if let Some(url) = management_url.or_else(|| self.management_service_url.clone()) {
            remote.management_service_url = url;
        }
        if remote.management_token.is_none() {
            remote.management_token = self.management_token.clone();
        }

        Ok(remote)
    }
}

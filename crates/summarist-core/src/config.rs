//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! catalog endpoint, timing knobs, and the last email used to sign in.
//!
//! Configuration is stored at `~/.config/summarist/config.json`. The
//! `SUMMARIST_API_URL` environment variable overrides the catalog endpoint.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::client::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::payment::DEFAULT_PROCESSING_DELAY_MS;
use crate::search::DEFAULT_DEBOUNCE_MS;

/// Application name used for config/data directory paths
const APP_NAME: &str = "summarist";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment override for the catalog endpoint
const API_URL_ENV: &str = "SUMMARIST_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub search_debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub checkout_delay_ms: u64,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            search_debounce_ms: DEFAULT_DEBOUNCE_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            checkout_delay_ms: DEFAULT_PROCESSING_DELAY_MS,
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Where the persisted key-value store lives.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("logs"))
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn checkout_delay(&self) -> Duration {
        Duration::from_millis(self.checkout_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.search_debounce(), Duration::from_millis(500));
        assert_eq!(config.request_timeout(), Duration::from_secs(8));
        assert_eq!(config.checkout_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"search_debounce_ms": 250}"#).unwrap();
        assert_eq!(config.search_debounce_ms, 250);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert!(config.last_email.is_none());
    }
}

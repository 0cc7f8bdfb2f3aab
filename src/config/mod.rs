use crate::error::Error;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the REST API base URL
pub const API_BASE_ENV: &str = "REMINDAR_API_BASE";
/// Environment variable holding the device/stream base URL
pub const STREAM_BASE_ENV: &str = "REMINDAR_STREAM_BASE";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub session: SessionConfig,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Backend REST API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// API base URL; absent means resource screens are not configured
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Wearable device / camera stream configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Device/stream base URL; absent disables status polling
    #[serde(default)]
    pub stream_base_url: Option<String>,
    /// Emergency status polling interval (seconds)
    #[serde(default = "default_emergency_poll_secs")]
    pub emergency_poll_secs: u64,
    /// Camera stream status polling interval (seconds)
    #[serde(default = "default_stream_poll_secs")]
    pub stream_poll_secs: u64,
    /// Seconds the wearer has to respond before the waiting card escalates
    #[serde(default = "default_response_window_secs")]
    pub response_window_secs: u64,
    /// Number handed to the platform dialer from an emergency card
    #[serde(default = "default_emergency_number")]
    pub emergency_number: String,
}

/// Local session persistence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// File backing the local key-value store
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_emergency_poll_secs() -> u64 {
    5
}

fn default_stream_poll_secs() -> u64 {
    10
}

fn default_response_window_secs() -> u64 {
    15
}

fn default_emergency_number() -> String {
    "911".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./remindar-session.json")
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            stream_base_url: None,
            emergency_poll_secs: default_emergency_poll_secs(),
            stream_poll_secs: default_stream_poll_secs(),
            response_window_secs: default_response_window_secs(),
            emergency_number: default_emergency_number(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            device: DeviceConfig::default(),
            session: SessionConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Override endpoint bases from environment lookups. Empty values count as absent.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(API_BASE_ENV) {
            self.api.base_url = non_empty(value);
        }
        if let Some(value) = lookup(STREAM_BASE_ENV) {
            self.device.stream_base_url = non_empty(value);
        }
    }

    /// Reject settings that would stop polling or requests from working
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("device.emergency_poll_secs", self.device.emergency_poll_secs),
            ("device.stream_poll_secs", self.device.stream_poll_secs),
            ("api.timeout_secs", self.api.timeout_secs),
        ];
        for (key, value) in intervals {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", key)).into());
            }
        }
        Ok(())
    }

    /// API base URL with blank values treated as not configured
    pub fn api_base(&self) -> Option<&str> {
        configured(&self.api.base_url)
    }

    /// Stream base URL with blank values treated as not configured
    pub fn stream_base(&self) -> Option<&str> {
        configured(&self.device.stream_base_url)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn configured(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Load configuration from a file or use default, then apply environment overrides
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => {
            let config_str = std::fs::read_to_string(path)
                .context(format!("Failed to read config file: {:?}", path))?;
            parse_config(path, &config_str)?
        }
        None => Config::default(),
    };

    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn parse_config(path: &Path, config_str: &str) -> Result<Config> {
    let config = if path.extension().map_or(false, |ext| ext == "json") {
        serde_json::from_str(config_str).context("Failed to parse JSON config")?
    } else if path.extension().map_or(false, |ext| ext == "toml") {
        toml::from_str(config_str).context("Failed to parse TOML config")?
    } else {
        return Err(anyhow::anyhow!("Unsupported config file format"));
    };
    Ok(config)
}

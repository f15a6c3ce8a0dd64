//! Configuration management

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding `api.base_url`
pub const BASE_URL_ENV: &str = "GASCONTROL_API_BASE_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub readings: ReadingsConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

        let app_config_dir = config_dir.join("gascontrol");

        if !app_config_dir.exists() {
            fs::create_dir_all(&app_config_dir)?;
        }

        Ok(app_config_dir.join("config.toml"))
    }

    /// Load configuration from disk, creating it with defaults on first run
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                log::info!("API base URL overridden by {}", BASE_URL_ENV);
                self.api.base_url = url.trim().to_string();
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Language: "pt", "en" or "auto"
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String { "pt".to_string() }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

/// REST API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Connect/response timeout applied to every call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Answer requests from the built-in mock backend instead of the network
    #[serde(default = "default_true")]
    pub mock_mode: bool,
}

fn default_base_url() -> String { "http://localhost:8000/api".to_string() }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_true() -> bool { true }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            mock_mode: true,
        }
    }
}

/// Reading entry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingsConfig {
    /// Number of previous readings used to judge a new consumption value
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

fn default_history_limit() -> u32 { 5 }

impl Default for ReadingsConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

/// CSV export settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Where downloaded files land; the user's download directory when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl ExportConfig {
    /// Resolve the effective export directory
    pub fn resolve_directory(&self) -> PathBuf {
        self.directory
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_BIND_ADDR, HOUSE_CANARY_API_KEY_ENV, HOUSE_CANARY_API_SECRET_ENV, HOUSE_CANARY_BASE_URL,
    HOUSE_CANARY_TIMEOUT_SECS,
};
use crate::error::{HomeDataError, Result};
use crate::pipeline::UnknownValuePolicy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub pipeline: PipelineSettings,
    pub house_canary: HouseCanaryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub unknown_values: UnknownValuePolicy,
    /// Directory for raw payload snapshots; unset disables them.
    pub payload_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HouseCanaryConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for HouseCanaryConfig {
    fn default() -> Self {
        Self {
            base_url: HOUSE_CANARY_BASE_URL.to_string(),
            timeout_seconds: HOUSE_CANARY_TIMEOUT_SECS,
        }
    }
}

impl HouseCanaryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Basic-auth credentials for a provider API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// House Canary credentials from the environment, if both parts are set.
    pub fn house_canary_from_env() -> Option<Self> {
        let api_key = std::env::var(HOUSE_CANARY_API_KEY_ENV).ok()?;
        let api_secret = std::env::var(HOUSE_CANARY_API_SECRET_ENV).ok()?;
        Some(Self::new(api_key, api_secret))
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            HomeDataError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.house_canary.timeout_seconds == 0 {
            return Err(HomeDataError::Config(
                "house_canary.timeout_seconds must be greater than zero".into(),
            ));
        }
        Ok(config)
    }
}

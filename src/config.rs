use crate::engine::EngineSettings;
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "swipedeck";
const CONFIG_FILE: &str = "config.toml";
const BACKEND_URL_VAR: &str = "SWIPEDECK_BACKEND_URL";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Serve a seeded in-memory deck instead of talking to the web API
    pub offline: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 5_000,
            offline: false,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub engine: EngineSettings,
}

impl AppConfig {
    /// Reads the config file, writing the defaults first if none exists.
    /// `SWIPEDECK_BACKEND_URL` overrides the backend URL.
    pub async fn load() -> Result<Self> {
        let path = config_path();
        ensure_default_config(&path).await?;

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env(env::var(BACKEND_URL_VAR).ok());

        info!("Loaded configuration from {}", path.display());
        debug!("Configuration: {:?}", config);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| eyre!("Failed to parse config file: {}", e))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| eyre!("Failed to serialize config: {}", e))
    }

    fn apply_env(&mut self, backend_url: Option<String>) {
        match backend_url {
            Some(url) if !url.trim().is_empty() => {
                info!("{} set, using backend {}", BACKEND_URL_VAR, url);
                self.backend.base_url = url.trim().to_string();
            }
            Some(_) => warn!("{} is empty, ignoring", BACKEND_URL_VAR),
            None => {}
        }
    }
}

async fn ensure_default_config(path: &PathBuf) -> Result<()> {
    if tokio::fs::try_exists(path)
        .await
        .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
    {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
    }
    let content = AppConfig::default().to_toml_string()?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| eyre!("Failed to write default config: {}", e))?;
    info!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| {
        warn!("Could not determine config directory, using current directory");
        PathBuf::from(".")
    });
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path
}

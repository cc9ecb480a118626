pub mod client_config;

use std::path::Path;

use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

pub use client_config::{ClientConfig, DiscoveryMode};

use crate::utils::ensure_directory_exists;

/// Environment variable naming the config file when no argument is given
pub const CONFIG_ENV_VAR: &str = "SMARTGLOVE_CONFIG";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub client: ClientConfig,
}

impl AppConfig {
    /// Loads the config from `path`. When the file does not exist the
    /// defaults are written there and returned.
    pub async fn load_config(path: &Path) -> Result<Self> {
        let file_path_str = path.to_string_lossy().into_owned();

        if !path.exists() {
            warn!(
                "Config file not found at {:?}, using default.",
                file_path_str
            );
            let config = Self::default();
            config.save_config(path).await?;
            return Ok(config);
        }

        let config_json = fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&config_json)?;
        config.client.validate()?;

        info!("Config loaded from {:?}", file_path_str);
        Ok(config)
    }

    /// Saves the config to `path`, creating the parent directory if needed.
    pub async fn save_config(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            ensure_directory_exists(parent).await?;
        }

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(path, config_json).await?;

        info!("Config saved to {:?}.", path.to_string_lossy());
        Ok(())
    }
}

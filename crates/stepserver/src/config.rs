use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stepruntime::RuntimeConfig;
use thiserror::Error;

/// Environment variable naming an optional TOML config file
pub const CONFIG_ENV: &str = "STEPFLOW_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Prefix of the live-update URLs handed back to submitters
    pub websocket_base_url: String,
    pub runtime: RuntimeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            websocket_base_url: "ws://localhost:3000/api/executions".to_string(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `$STEPFLOW_CONFIG` (if set), then apply `BIND_ADDRESS` and
    /// `WEBSOCKET_BASE_URL` overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind_address) = lookup("BIND_ADDRESS") {
            self.bind_address = bind_address;
        }
        if let Some(url) = lookup("WEBSOCKET_BASE_URL") {
            self.websocket_base_url = url;
        }
    }
}

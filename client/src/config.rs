use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

use anyhow::{anyhow, Result};

/// Read-only after startup; constructed once and passed down explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: Url,
    /// Whether uploads get a delete password by default.
    pub deletable: bool,
    pub password_min_length: usize,
    pub password_max_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            deletable: false,
            password_min_length: 20,
            password_max_length: 30,
        }
    }
}

fn default_server_url() -> Url {
    "https://drop.forsla.net".parse().unwrap()
}

pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| anyhow!("cannot find config dir"))?;
    Ok(config_dir.join("forsla.json5"))
}

impl Config {
    /// Loads the configuration, falling back to the defaults when the file
    /// is missing or malformed. A broken config is worth a warning, not a
    /// refused transfer.
    pub fn load(path: Option<&Path>) -> Self {
        let explicit = path.is_some();
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Ok(path) => path,
                Err(err) => {
                    warn!("{err:#}; using default config");
                    return Self::default();
                }
            },
        };
        if !explicit && !path.exists() {
            debug!("no config file at {path:?}; using defaults");
            return Self::default();
        }
        match Self::try_load(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!("failed to load config from {path:?}: {err:#}; using defaults");
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self> {
        Ok(json5::from_str(&fs_err::read_to_string(path)?)?)
    }
}

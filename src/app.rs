use directories::BaseDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3001";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory available on this device")]
    NoConfigDir,

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialise settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppState {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub poll_interval_secs: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            poll_interval_secs: 5,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toml_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("noticeboard.toml"))
    }

    pub fn load() -> Self {
        match Self::toml_path() {
            Some(path) => Self::load_from(&path),
            None => Self::new(),
        }
    }

    /// Read settings from `path`; a missing or unreadable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(text) = fs::read_to_string(path) else {
            return Self::new();
        };
        match toml::from_str::<AppState>(&text) {
            Ok(state) => state,
            Err(e) => {
                warn!("ignoring invalid settings at {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::toml_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml).map_err(write_err)
    }

    /// Apply command-line overrides on top of the saved settings.
    pub fn with_overrides(mut self, base_url: Option<&str>, api_key: Option<&str>) -> Self {
        if let Some(url) = base_url {
            self.base_url = crate::utils::normalize_url(url);
        }
        if let Some(key) = api_key {
            self.api_key = Some(key.to_string()).filter(|k| !k.is_empty());
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

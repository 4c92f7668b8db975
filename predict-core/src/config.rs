use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::client::DEFAULT_ENDPOINT;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// endpoint = "http://10.0.0.5:5011/predict"
/// history_file = "/home/me/predictions.db"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Prediction service URL; `None` means the local default.
    pub endpoint: Option<String>,

    /// Where saved predictions live; `None` means the platform data dir.
    pub history_file: Option<PathBuf>,
}

impl Config {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(anyhow!("Endpoint '{endpoint}' must be an http:// or https:// URL"));
        }

        self.endpoint = if endpoint == DEFAULT_ENDPOINT { None } else { Some(endpoint.to_string()) };
        Ok(())
    }

    pub fn history_file(&self) -> Result<PathBuf> {
        match &self.history_file {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("predictions.db")),
        }
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::from_toml(
            &fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?,
        )
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-predict", "weather-predict")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

//! Loads `ClientConfig` from `config.toml` and the environment.
//!
//! Priority: environment variables > config file > built-in defaults.

use crate::paths::StepwisePaths;
use std::path::{Path, PathBuf};
use stepwise_core::config::{ClientConfig, StorageConfig};
use stepwise_core::error::{Result, StepwiseError};

pub const ENV_API_URL: &str = "STEPWISE_API_URL";
pub const ENV_USER_ID: &str = "STEPWISE_USER_ID";
pub const ENV_TOKEN: &str = "STEPWISE_TOKEN";
pub const ENV_HOME_TASK: &str = "STEPWISE_HOME_TASK";
pub const ENV_DATA_DIR: &str = "STEPWISE_DATA_DIR";
pub const ENV_LOG: &str = "STEPWISE_LOG";

pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses `~/.config/stepwise/config.toml`.
    pub fn new_default() -> Result<Self> {
        Ok(Self::with_path(StepwisePaths::config_file()?))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the config file; a missing or empty file yields the defaults.
    pub fn load_file(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[ConfigService] No config at {}, using defaults",
                self.path.display()
            );
            return Ok(ClientConfig::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            StepwiseError::io(format!(
                "Failed to read configuration file at {}: {}",
                self.path.display(),
                e
            ))
        })?;
        if content.trim().is_empty() {
            return Ok(ClientConfig::default());
        }

        toml::from_str(&content).map_err(|e| {
            StepwiseError::config(format!(
                "Failed to parse configuration file at {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Reads the file and applies process environment overrides.
    pub fn load(&self) -> Result<ClientConfig> {
        let mut config = self.load_file()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    /// Writes `config` back to the file, creating the directory if needed.
    pub fn save(&self, config: &ClientConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Applies `STEPWISE_*` overrides read through `lookup`.
///
/// Blank values are ignored.
pub fn apply_env_overrides<F>(config: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = get(ENV_API_URL) {
        config.api_base_url = url;
    }
    if let Some(user_id) = get(ENV_USER_ID) {
        config.auth.user_id = Some(user_id);
    }
    if let Some(token) = get(ENV_TOKEN) {
        config.auth.token = Some(token);
    }
    if let Some(home) = get(ENV_HOME_TASK) {
        config.home_task_id = Some(home);
    }
    if let Some(dir) = get(ENV_DATA_DIR) {
        config.storage = StorageConfig::File {
            data_dir: Some(PathBuf::from(dir)),
        };
    }
    if let Some(level) = get(ENV_LOG) {
        config.log_level = level;
    }
}

//! Client configuration model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 30;

/// Where progress documents and transcripts are kept.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Process-lifetime only.
    #[default]
    Memory,
    /// One JSON file per document under `data_dir` (defaults to the platform data dir).
    File {
        #[serde(default)]
        data_dir: Option<PathBuf>,
    },
}

/// Static credentials for the built-in auth provider.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Task that navigation leaves for the first regular task once finished.
    #[serde(default)]
    pub home_task_id: Option<String>,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Seconds between connectivity probes; 0 disables the probe.
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_probe_interval() -> u64 {
    DEFAULT_PROBE_INTERVAL_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            home_task_id: None,
            storage: StorageConfig::default(),
            probe_interval_secs: default_probe_interval(),
            log_level: default_log_level(),
            auth: AuthConfig::default(),
        }
    }
}

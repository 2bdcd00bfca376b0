//! Unified path management for Stepwise files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/stepwise/          # Config directory
//! └── config.toml              # Client configuration
//!
//! ~/.local/share/stepwise/     # Data directory
//! └── documents/               # JsonFileDocumentStore root
//! ```

use std::path::PathBuf;
use stepwise_core::error::{Result, StepwiseError};

const APP_DIR: &str = "stepwise";

pub struct StepwisePaths;

impl StepwisePaths {
    /// Returns the configuration directory (e.g., `~/.config/stepwise/`).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| StepwiseError::config("Cannot determine config directory"))
    }

    /// Returns the data directory (e.g., `~/.local/share/stepwise/`).
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| StepwiseError::config("Cannot determine data directory"))
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Default root of the file-backed document store.
    pub fn documents_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("documents"))
    }
}

//! Configuration management
//!
//! Handles loading, saving and validating the YAML configuration file.
//!
//! ```yaml
//! poll_interval_ms: 16
//! gamepad:
//!   mapping_files:
//!     - ./mappings/arcade.txt
//!   synthesize_missing_mappings: true
//!   watch_mappings: false
//!   trigger_range: bipolar   # optional override
//! ```

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::input::gamepad::{ManagerConfig, TriggerRange};

pub use watcher::MappingWatcher;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    /// Frame period of the poll loop
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub gamepad: GamepadConfig,
}

/// Gamepad configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GamepadConfig {
    /// Mapping files loaded in addition to the discovered `gamecontrollerdb.txt`
    #[serde(default)]
    pub mapping_files: Vec<PathBuf>,
    /// Generate a mapping for joysticks with no known layout
    #[serde(default = "default_true")]
    pub synthesize_missing_mappings: bool,
    /// Reload mapping files when they change on disk
    #[serde(default)]
    pub watch_mappings: bool,
    /// Range the backend reports triggers in (default: backend's own)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_range: Option<TriggerRange>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            gamepad: GamepadConfig::default(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            mapping_files: Vec::new(),
            synthesize_missing_mappings: default_true(),
            watch_mappings: false,
            trigger_range: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a YAML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than 0");
        }

        for (idx, file) in self.gamepad.mapping_files.iter().enumerate() {
            if file.as_os_str().is_empty() {
                anyhow::bail!("gamepad.mapping_files[{}] cannot be empty", idx);
            }
        }

        Ok(())
    }

    /// Settings for the joystick manager
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            mapping_files: self.gamepad.mapping_files.clone(),
            synthesize_missing_mappings: self.gamepad.synthesize_missing_mappings,
            trigger_range: self.gamepad.trigger_range,
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_poll_interval() -> u64 { 16 }

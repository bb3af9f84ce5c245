//! Input engine configuration
//!
//! Stored in `~/.config/inputmux/config.yaml`. Every field is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Tunables for key handling, autorepeat and binding sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Maximum queued commands before key-generated ones are dropped
    pub key_fifo_size: usize,
    /// Two clicks closer than this form a double click; 0 disables
    pub doubleclick_time_ms: u64,
    /// Delay before a held key starts repeating
    pub autorepeat_delay_ms: u64,
    /// Repeats per second; 0 disables autorepeat
    pub autorepeat_rate: u32,
    /// Consider builtin bindings when no user binding matches
    pub default_bindings: bool,
    /// Load the embedded input.conf at startup
    pub builtin_bindings: bool,
    /// Show the bindings of each key instead of running them
    pub test: bool,
    /// Accept mouse buttons, wheel and pointer movement
    pub enable_mouse_movements: bool,
    pub allow_win_drag: bool,
    /// input.conf to load instead of the one in the config directory
    pub input_conf: Option<PathBuf>,
    /// Load the user's input.conf at startup
    pub load_user_conf: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            key_fifo_size: 7,
            doubleclick_time_ms: 300,
            autorepeat_delay_ms: 200,
            autorepeat_rate: 40,
            default_bindings: true,
            builtin_bindings: true,
            test: false,
            enable_mouse_movements: true,
            allow_win_drag: true,
            input_conf: None,
            load_user_conf: true,
        }
    }
}

impl InputConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{:#}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Read and parse a YAML config file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn doubleclick_time(&self) -> Duration {
        Duration::from_millis(self.doubleclick_time_ms)
    }

    pub fn autorepeat_delay(&self) -> Duration {
        Duration::from_millis(self.autorepeat_delay_ms)
    }
}

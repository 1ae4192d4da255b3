// src/config/file.rs
// File-based configuration from ~/.logwatch/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, WatchError};

/// Floor for the poll interval; tokio intervals cannot tick at zero
const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Top-level config structure
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct LogwatchConfig {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where a new watch session starts reading
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StartPosition {
    /// Deliver every row after the header
    #[default]
    Header,
    /// Deliver the newest complete row already in the file, then new rows
    LatestRow,
}

/// Poll loop and delivery settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    pub poll_interval_ms: u64,
    /// How long stop() waits for the poll task before aborting it
    pub join_timeout_ms: u64,
    /// Use OS change notifications as early wake-ups
    pub notify: bool,
    pub start_position: StartPosition,
    /// Bounded event channel size per session
    pub channel_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            join_timeout_ms: 1000,
            notify: true,
            start_position: StartPosition::Header,
            channel_capacity: 1024,
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

/// Column visibility persistence
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct ColumnsConfig {
    /// Override for the visibility file (default ~/.logwatch/column_visibility.json)
    pub visibility_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct LoggingConfig {
    /// tracing level: error, warn, info, debug, trace
    pub level: Option<String>,
}

impl LogwatchConfig {
    /// Load config from ~/.logwatch/config.toml, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Load from an explicit path; unlike `load`, a bad file is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| WatchError::Config(format!("{}: {}", path.display(), e)))
    }

    /// ~/.logwatch
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".logwatch")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Resolved visibility file location
    pub fn visibility_file(&self) -> PathBuf {
        self.columns
            .visibility_file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("column_visibility.json"))
    }
}

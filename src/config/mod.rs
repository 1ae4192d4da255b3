// src/config/mod.rs
// Configuration: TOML file, then LOGWATCH_* environment overrides

pub mod env;
pub mod file;

pub use env::EnvOverrides;
pub use file::{ColumnsConfig, LoggingConfig, LogwatchConfig, StartPosition, WatchConfig};

impl LogwatchConfig {
    /// File config with environment overrides applied
    pub fn resolve() -> Self {
        let mut config = Self::load();
        EnvOverrides::from_env().apply(&mut config);
        config
    }
}

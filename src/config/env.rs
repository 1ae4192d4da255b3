// src/config/env.rs
// Environment overrides - single source of truth for all env vars

use std::path::PathBuf;
use tracing::warn;

use super::LogwatchConfig;

/// Values read from LOGWATCH_* variables. Unset or unparsable values are
/// `None` and leave the file config alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    /// LOGWATCH_POLL_INTERVAL_MS
    pub poll_interval_ms: Option<u64>,
    /// LOGWATCH_NOTIFY
    pub notify: Option<bool>,
    /// LOGWATCH_VISIBILITY_FILE
    pub visibility_file: Option<PathBuf>,
    /// LOGWATCH_LOG_LEVEL
    pub log_level: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let poll_interval_ms = read("LOGWATCH_POLL_INTERVAL_MS").and_then(|v| match v.parse() {
            Ok(ms) => Some(ms),
            Err(_) => {
                warn!(value = %v, "LOGWATCH_POLL_INTERVAL_MS is not a number, ignoring");
                None
            }
        });

        Self {
            poll_interval_ms,
            notify: read("LOGWATCH_NOTIFY").and_then(|v| parse_bool(&v)),
            visibility_file: read("LOGWATCH_VISIBILITY_FILE").map(PathBuf::from),
            log_level: read("LOGWATCH_LOG_LEVEL"),
        }
    }

    pub fn apply(self, config: &mut LogwatchConfig) {
        if let Some(ms) = self.poll_interval_ms {
            config.watch.poll_interval_ms = ms;
        }
        if let Some(notify) = self.notify {
            config.watch.notify = notify;
        }
        if let Some(path) = self.visibility_file {
            config.columns.visibility_file = Some(path);
        }
        if let Some(level) = self.log_level {
            config.logging.level = Some(level);
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment() {
        let overrides = EnvOverrides::from_lookup(lookup(&[]));
        assert_eq!(overrides, EnvOverrides::default());
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let overrides = EnvOverrides::from_lookup(lookup(&[
            ("LOGWATCH_POLL_INTERVAL_MS", "40"),
            ("LOGWATCH_NOTIFY", "off"),
            ("LOGWATCH_VISIBILITY_FILE", "/data/vis.json"),
            ("LOGWATCH_LOG_LEVEL", " debug "),
        ]));
        let mut config = LogwatchConfig::default();
        overrides.apply(&mut config);

        assert_eq!(config.watch.poll_interval_ms, 40);
        assert!(!config.watch.notify);
        assert_eq!(config.visibility_file(), PathBuf::from("/data/vis.json"));
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_bad_values_are_ignored() {
        let overrides = EnvOverrides::from_lookup(lookup(&[
            ("LOGWATCH_POLL_INTERVAL_MS", "fast"),
            ("LOGWATCH_NOTIFY", "maybe"),
            ("LOGWATCH_LOG_LEVEL", "   "),
        ]));
        assert_eq!(overrides, EnvOverrides::default());
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("2"), None);
    }
}

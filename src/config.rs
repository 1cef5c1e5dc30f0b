// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::model::parser::parse_time_string;
use crate::model::{Priority, SortStrategy};
use crate::storage::LocalStorage;
use anyhow::{Error, Result};
use chrono::NaiveTime;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;

fn default_true() -> bool {
    true
}

fn default_remind_time() -> String {
    "08:00".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub default_sort: SortStrategy,
    #[serde(default)]
    pub default_priority: Priority,
    #[serde(default = "default_remind_time")]
    pub default_reminder_time: String, // Format "HH:MM"
    #[serde(default = "default_true")]
    pub autosave: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Maximum undo depth; 0 (the default) keeps everything.
    #[serde(default)]
    pub max_history: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_sort: SortStrategy::default(),
            default_priority: Priority::default(),
            default_reminder_time: default_remind_time(),
            autosave: true,
            log_level: default_log_level(),
            max_history: 0,
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(config) => Ok(config),
            Err(e) if Self::is_missing_config_error(&e) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Whether an error returned by `load` means the config file was absent.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }
        err.chain().any(|cause| {
            cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
        })
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }

    /// Time of day used when a reminder is given as a bare date.
    /// Falls back to 08:00 if the configured value does not parse.
    pub fn reminder_time(&self) -> NaiveTime {
        parse_time_string(&self.default_reminder_time)
            .or_else(|| NaiveTime::from_hms_opt(8, 0, 0))
            .unwrap_or_default()
    }

    /// Unknown level names fall back to `Info`.
    pub fn log_level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;

    #[test]
    fn test_missing_file_is_detected() {
        let ctx = TestContext::new();
        let err = Config::load(&ctx).unwrap_err();
        assert!(Config::is_missing_config_error(&err));
        assert_eq!(Config::load_or_default(&ctx).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let ctx = TestContext::new();
        let path = ctx.get_config_file_path().unwrap();
        fs::write(&path, "default_sort = \"priority\"\nautosave = false\n").unwrap();

        let config = Config::load(&ctx).unwrap();
        assert_eq!(config.default_sort, SortStrategy::Priority);
        assert!(!config.autosave);
        assert_eq!(config.default_priority, Priority::Medium);
        assert_eq!(config.max_history, 0);
    }

    #[test]
    fn test_parse_error_is_not_missing() {
        let ctx = TestContext::new();
        let path = ctx.get_config_file_path().unwrap();
        fs::write(&path, "default_sort = [").unwrap();
        let err = Config::load(&ctx).unwrap_err();
        assert!(!Config::is_missing_config_error(&err));
        assert!(Config::load_or_default(&ctx).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let ctx = TestContext::new();
        let config = Config {
            default_priority: Priority::High,
            default_reminder_time: "07:30".to_string(),
            max_history: 25,
            ..Config::default()
        };
        config.save(&ctx).unwrap();
        let loaded = Config::load(&ctx).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.reminder_time(), NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = Config {
            default_reminder_time: "late".to_string(),
            log_level: "chatty".to_string(),
            ..Config::default()
        };
        assert_eq!(config.reminder_time(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(config.log_level_filter(), LevelFilter::Info);
        assert_eq!(Config::default().log_level_filter(), LevelFilter::Info);
    }
}

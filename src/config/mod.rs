use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use chrono::Duration;
use thiserror::Error;

use crate::core::reminders::ReminderPolicy;
use crate::core::services::RecordSettings;
use crate::errors::PersistenceError;
use crate::storage::json_backend::write_atomic;

const DEFAULT_DIR_NAME: &str = ".finance_core";
const CONFIG_FILE: &str = "config.json";
const DATA_DIR: &str = "data";
pub const HOME_ENV: &str = "FINANCE_CORE_HOME";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("Invalid config value for `{field}`: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Persistence(err.into())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Persistence(err.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub currency: String,
    pub horizon_months: u32,
    pub refresh_interval_hours: i64,
    pub reminder_window_months: u32,
    pub reminder_cooldown_hours: i64,
    pub recent_limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: "USD".into(),
            horizon_months: 24,
            refresh_interval_hours: 24,
            reminder_window_months: 1,
            reminder_cooldown_hours: 24,
            recent_limit: 3,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn record_settings(&self) -> RecordSettings {
        RecordSettings {
            horizon_months: self.horizon_months,
        }
    }

    pub fn reminder_policy(&self) -> Result<ReminderPolicy, ConfigError> {
        Ok(ReminderPolicy {
            window_months: self.reminder_window_months,
            cooldown: hours("reminder_cooldown_hours", self.reminder_cooldown_hours)?,
        })
    }

    pub fn refresh_interval(&self) -> Result<Duration, ConfigError> {
        hours("refresh_interval_hours", self.refresh_interval_hours)
    }

    /// Rejects values that cannot be turned into the durations above.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.reminder_policy()?;
        self.refresh_interval()?;
        Ok(())
    }
}

fn hours(field: &'static str, value: i64) -> Result<Duration, ConfigError> {
    if value < 0 {
        return Err(ConfigError::OutOfRange { field, value });
    }
    Duration::try_hours(value).ok_or(ConfigError::OutOfRange { field, value })
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    /// Uses `FINANCE_CORE_HOME` when set, `~/.finance_core` otherwise.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(base_dir())
    }

    pub fn with_base_dir(base: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(Self {
            path: base.join(CONFIG_FILE),
            base,
        })
    }

    /// Reads the config file, falling back to defaults when it is absent.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    /// Directory holding the record collections for `config`.
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        config
            .data_dir
            .clone()
            .unwrap_or_else(|| self.base.join(DATA_DIR))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn base_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.record_settings().horizon_months, 24);
        assert_eq!(manager.data_dir(&config), dir.path().join("data"));
    }

    #[test]
    fn partial_file_fills_remaining_fields() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path()).unwrap();
        fs::write(manager.path(), r#"{ "currency": "EUR", "horizon_months": 12 }"#).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.horizon_months, 12);
        assert_eq!(config.recent_limit, 3);
    }

    #[test]
    fn save_round_trips() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path()).unwrap();
        let config = Config {
            reminder_cooldown_hours: 48,
            data_dir: Some(dir.path().join("elsewhere")),
            ..Config::default()
        };
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
        assert_eq!(config.reminder_policy().unwrap().cooldown, Duration::hours(48));
    }

    #[test]
    fn out_of_range_hours_are_rejected() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path()).unwrap();
        fs::write(
            manager.path(),
            r#"{ "refresh_interval_hours": 9223372036854775807 }"#,
        )
        .unwrap();
        let err = manager.load().expect_err("overflowing interval");
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "refresh_interval_hours",
                ..
            }
        ));

        let negative = Config {
            reminder_cooldown_hours: -1,
            ..Config::default()
        };
        assert!(negative.reminder_policy().is_err());
        assert!(manager.save(&negative).is_err());
        assert_eq!(Config::default().refresh_interval().unwrap(), Duration::hours(24));
    }
}

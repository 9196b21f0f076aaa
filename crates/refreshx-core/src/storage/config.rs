//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Work hours and break preferences
//! - Reminder lead time
//! - Calendar offset and first day of the week
//! - Body measurements used for calorie estimates
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::profile::{UserSettings, WorkProfile};
use crate::time::Calendar;

const TIME_FORMAT: &str = "%H:%M";

/// Work-hours configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkConfig {
    /// Clock-in time as `HH:MM`.
    #[serde(default = "default_start")]
    pub start: String,
    /// Clock-out time as `HH:MM`.
    #[serde(default = "default_end")]
    pub end: String,
    #[serde(default = "default_weekdays")]
    pub weekdays: u8,
    #[serde(default = "default_breaks")]
    pub breaks: u32,
    #[serde(default = "default_break_duration")]
    pub break_duration_min: u32,
}

/// Reminder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemindersConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_minutes_before")]
    pub minutes_before: u32,
}

/// Calendar configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Minutes east of UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_week_start")]
    pub week_start: String,
}

/// Body measurements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Display name of the local user.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub work: WorkConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub body: BodyConfig,
}

fn default_name() -> String {
    "You".into()
}
fn default_start() -> String {
    "09:00".into()
}
fn default_end() -> String {
    "17:00".into()
}
fn default_weekdays() -> u8 {
    5
}
fn default_breaks() -> u32 {
    5
}
fn default_break_duration() -> u32 {
    15
}
fn default_true() -> bool {
    true
}
fn default_minutes_before() -> u32 {
    5
}
fn default_week_start() -> String {
    "monday".into()
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
            weekdays: default_weekdays(),
            breaks: default_breaks(),
            break_duration_min: default_break_duration(),
        }
    }
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            minutes_before: default_minutes_before(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            week_start: default_week_start(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            work: WorkConfig::default(),
            reminders: RemindersConfig::default(),
            calendar: CalendarConfig::default(),
            body: BodyConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => parse_number(value)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                    // Unset optional: a number, or "none" to keep it unset
                    serde_json::Value::Null => {
                        if value.eq_ignore_ascii_case("none") {
                            serde_json::Value::Null
                        } else {
                            parse_number(value)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot replace a whole section".into()));
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// `<data_dir>/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// The result must still describe a valid work profile, calendar and
    /// body; otherwise `self` is left unchanged.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let check = |result: Result<(), ConfigError>| {
            result.map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })
        };
        check(updated.work_profile().map(|_| ()))?;
        check(updated.calendar().map(|_| ()))?;
        check(updated.settings(Uuid::nil(), Utc::now()).map(|_| ()))?;

        *self = updated;
        Ok(())
    }

    /// The configured work window as a validated profile.
    ///
    /// # Errors
    /// Returns an error on unparseable times or out-of-range values.
    pub fn work_profile(&self) -> Result<WorkProfile, ConfigError> {
        let start = parse_time("work.start", &self.work.start)?;
        let end = parse_time("work.end", &self.work.end)?;
        WorkProfile::new(
            start,
            end,
            self.work.weekdays,
            self.work.breaks,
            self.work.break_duration_min,
        )
        .map_err(|e| ConfigError::InvalidValue {
            key: format!("work.{}", e.field()),
            message: e.to_string(),
        })
    }

    /// # Errors
    /// Returns an error on an unknown weekday or an offset beyond ±24h.
    pub fn calendar(&self) -> Result<Calendar, ConfigError> {
        let week_start: Weekday =
            self.calendar
                .week_start
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "calendar.week_start".into(),
                    message: format!("unknown weekday '{}'", self.calendar.week_start),
                })?;
        let calendar = Calendar::with_offset_minutes(self.calendar.utc_offset_minutes).map_err(|e| {
            ConfigError::InvalidValue {
                key: "calendar.utc_offset_minutes".into(),
                message: e.to_string(),
            }
        })?;
        Ok(calendar.with_week_start(week_start))
    }

    /// Settings for `user_id` built from the reminder and body sections.
    ///
    /// # Errors
    /// Returns an error on out-of-range body or reminder values.
    pub fn settings(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<UserSettings, ConfigError> {
        let to_config_error = |section: &str, e: crate::error::ValidationError| ConfigError::InvalidValue {
            key: format!("{section}.{}", e.field()),
            message: e.to_string(),
        };
        let mut settings = UserSettings::new(user_id, now)
            .with_body(self.body.weight_kg, self.body.height_cm)
            .map_err(|e| to_config_error("body", e))?
            .with_reminders_before(self.reminders.minutes_before)
            .map_err(|e| to_config_error("reminders", e))?;
        settings.break_reminders_enabled = self.reminders.enabled;
        Ok(settings)
    }
}

fn parse_time(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected HH:MM, got '{value}'"),
    })
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<u64>() {
        Some(serde_json::Value::Number(n.into()))
    } else if let Ok(n) = value.parse::<i64>() {
        Some(serde_json::Value::Number(n.into()))
    } else {
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
    }
}

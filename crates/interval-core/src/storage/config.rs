//! TOML-based application configuration.
//!
//! Stores:
//! - Session behavior (tick period, what stop does, health timeout)
//! - Companion sync policy
//! - Energy estimation for devices without a health service
//!
//! Configuration is stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;
use crate::session::StopBehavior;
use crate::sync::SyncMode;

/// Session runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Wall-clock period of one tick. A tick always counts as one second of workout time.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub stop_behavior: StopBehavior,
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
}

/// Companion sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub mode: SyncMode,
    /// In continuous mode, push a snapshot every N ticks while running.
    #[serde(default = "default_push_every_secs")]
    pub push_every_secs: u64,
}

/// Energy estimation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_kcal_per_minute")]
    pub kcal_per_minute: f64,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_health_timeout_secs() -> u64 {
    10
}
fn default_push_every_secs() -> u64 {
    1
}
fn default_kcal_per_minute() -> f64 {
    10.0
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            stop_behavior: StopBehavior::default(),
            health_timeout_secs: default_health_timeout_secs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::default(),
            push_every_secs: default_push_every_secs(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            kcal_per_minute: default_kcal_per_minute(),
        }
    }
}

impl Config {
    const FILE_NAME: &'static str = "config.toml";

    fn get_json_value_by_path<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut Value, key: &str, value: &str) -> Result<(), ConfigError> {
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
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let new_value = match obj.get(part).ok_or_else(unknown)? {
                Value::Bool(_) => Value::Bool(value.parse::<bool>().map_err(|e| invalid(e.to_string()))?),
                Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        Value::Number(n.into())
                    } else {
                        value
                            .parse::<f64>()
                            .ok()
                            .and_then(serde_json::Number::from_f64)
                            .map(Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    }
                }
                Value::Object(_) => return Err(unknown()),
                _ => Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Load `config.toml` from `dir`, writing the defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(Self::FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(dir)?;
                Ok(cfg)
            }
        }
    }

    /// Load from the application data directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&data_dir()?)
    }

    pub fn save_to(&self, dir: &Path) -> Result<(), ConfigError> {
        let path: PathBuf = dir.join(Self::FILE_NAME);
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&data_dir()?)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a leaf value by dot-separated key. Does not persist; call [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// All leaf keys with their current values, in `section.field` form.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(Value::Object(sections)) = serde_json::to_value(self) {
            for (section, fields) in sections {
                if let Value::Object(fields) = fields {
                    for (field, value) in fields {
                        let rendered = match value {
                            Value::String(s) => s,
                            other => other.to_string(),
                        };
                        out.push((format!("{section}.{field}"), rendered));
                    }
                }
            }
        }
        out
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.session.tick_interval_ms.max(1))
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.session.health_timeout_secs)
    }
}

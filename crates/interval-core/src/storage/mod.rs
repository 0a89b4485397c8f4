mod config;
pub mod database;

pub use config::{Config, HealthConfig, SessionConfig, SyncConfig};
pub use database::{Database, SUBSCRIPTION_PRODUCTS};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the application data directory, creating it if needed.
///
/// `INTERVAL_TRAINER_HOME` overrides the location outright. Otherwise this is
/// `~/.config/interval-trainer/`, or `~/.config/interval-trainer-dev/` when
/// `INTERVAL_TRAINER_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("INTERVAL_TRAINER_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("INTERVAL_TRAINER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("interval-trainer-dev")
            } else {
                base_dir.join("interval-trainer")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

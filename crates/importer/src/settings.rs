//! Typed access to the runtime settings stored in the `settings` table.

use std::time::Duration;

use cliparr_core::types::ImportMode;
use cliparr_db::repo::settings as repo;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::warn;

/// Upper bound for the polling interval: one week.
pub const MAX_POLLING_INTERVAL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("invalid import mode '{0}' (expected none, import or auto)")]
    InvalidMode(String),
    #[error("invalid polling interval {0}s (expected 1 to 604800)")]
    InvalidInterval(i64),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Values used when a setting is missing or unreadable.
#[derive(Debug, Clone, Copy)]
pub struct SettingsDefaults {
    pub import_mode: ImportMode,
    pub polling_interval_secs: u64,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            import_mode: ImportMode::None,
            polling_interval_secs: 300,
        }
    }
}

#[derive(Clone)]
pub struct Settings {
    pool: SqlitePool,
    defaults: SettingsDefaults,
}

impl Settings {
    pub fn new(pool: SqlitePool, defaults: SettingsDefaults) -> Self {
        Self { pool, defaults }
    }

    /// Insert the configured defaults for settings that have never been written.
    pub async fn seed_defaults(&self) -> Result<(), SettingsError> {
        let interval = self.defaults.polling_interval_secs.to_string();
        repo::insert_defaults(
            &self.pool,
            &[
                (repo::IMPORT_MODE, self.defaults.import_mode.as_str()),
                (repo::POLLING_INTERVAL, &interval),
            ],
        )
        .await?;
        Ok(())
    }

    pub async fn get_import_mode(&self) -> Result<ImportMode, SettingsError> {
        let stored = repo::get(&self.pool, repo::IMPORT_MODE).await?;
        let Some(raw) = stored else {
            return Ok(self.defaults.import_mode);
        };
        match raw.parse() {
            Ok(mode) => Ok(mode),
            Err(_) => {
                warn!(value = %raw, default = %self.defaults.import_mode, "stored import mode is invalid, using default");
                Ok(self.defaults.import_mode)
            }
        }
    }

    /// Parse and persist a new mode. Invalid input leaves the stored value alone.
    pub async fn set_import_mode(&self, raw: &str) -> Result<ImportMode, SettingsError> {
        let mode: ImportMode = raw
            .parse()
            .map_err(|_| SettingsError::InvalidMode(raw.to_string()))?;
        repo::set(&self.pool, repo::IMPORT_MODE, mode.as_str()).await?;
        Ok(mode)
    }

    pub async fn get_polling_interval(&self) -> Result<Duration, SettingsError> {
        let stored = repo::get(&self.pool, repo::POLLING_INTERVAL).await?;
        let fallback = Duration::from_secs(self.defaults.polling_interval_secs);
        let Some(raw) = stored else {
            return Ok(fallback);
        };
        match raw.trim().parse::<i64>() {
            Ok(secs) if validate_interval(secs).is_ok() => Ok(Duration::from_secs(secs as u64)),
            _ => {
                warn!(value = %raw, default_secs = fallback.as_secs(), "stored polling interval is invalid, using default");
                Ok(fallback)
            }
        }
    }

    pub async fn set_polling_interval(&self, secs: i64) -> Result<Duration, SettingsError> {
        validate_interval(secs)?;
        repo::set(&self.pool, repo::POLLING_INTERVAL, &secs.to_string()).await?;
        Ok(Duration::from_secs(secs as u64))
    }
}

pub fn validate_interval(secs: i64) -> Result<(), SettingsError> {
    if (1..=MAX_POLLING_INTERVAL_SECS).contains(&secs) {
        Ok(())
    } else {
        Err(SettingsError::InvalidInterval(secs))
    }
}

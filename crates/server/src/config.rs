//! Process configuration read from the environment (and `.env`, if present).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use cliparr_core::types::ImportMode;
use cliparr_importer::settings::{MAX_POLLING_INTERVAL_SECS, SettingsDefaults};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub sonarr_url: String,
    pub sonarr_api_key: String,
    pub catalog_timeout: Duration,
    pub require_catalog: bool,
    pub bind_addr: SocketAddr,
    pub db_path: String,
    pub default_import_mode: ImportMode,
    pub default_polling_interval_secs: u64,
    pub stop_timeout: Duration,
    pub static_dir: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Config {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("CLIPARR_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_var("CLIPARR_PORT", get("CLIPARR_PORT"), 5000)?;
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "CLIPARR_HOST",
                value: host.clone(),
                reason: e.to_string(),
            })?;

        let catalog_timeout_secs: u64 = parse_var(
            "CLIPARR_CATALOG_TIMEOUT_SECS",
            get("CLIPARR_CATALOG_TIMEOUT_SECS"),
            15,
        )?;
        if catalog_timeout_secs == 0 {
            return Err(invalid("CLIPARR_CATALOG_TIMEOUT_SECS", "0", "must be at least 1"));
        }

        let default_import_mode = match get("CLIPARR_IMPORT_MODE") {
            Some(raw) => raw
                .parse()
                .map_err(|e: cliparr_core::types::InvalidImportMode| {
                    invalid("CLIPARR_IMPORT_MODE", &raw, &e.to_string())
                })?,
            None => ImportMode::None,
        };

        let default_polling_interval_secs: u64 = parse_var(
            "CLIPARR_POLLING_INTERVAL",
            get("CLIPARR_POLLING_INTERVAL"),
            300,
        )?;
        if default_polling_interval_secs == 0
            || default_polling_interval_secs > MAX_POLLING_INTERVAL_SECS as u64
        {
            return Err(invalid(
                "CLIPARR_POLLING_INTERVAL",
                &default_polling_interval_secs.to_string(),
                "must be between 1 second and 7 days",
            ));
        }

        let stop_timeout_secs: u64 = parse_var(
            "CLIPARR_STOP_TIMEOUT_SECS",
            get("CLIPARR_STOP_TIMEOUT_SECS"),
            30,
        )?;

        let log_format = match get("CLIPARR_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(invalid("CLIPARR_LOG_FORMAT", other, "expected pretty or json"));
            }
        };

        Ok(Self {
            sonarr_url: get("SONARR_URL").unwrap_or_else(|| "http://localhost:8989".to_string()),
            sonarr_api_key: lookup("SONARR_API_KEY").unwrap_or_default(),
            catalog_timeout: Duration::from_secs(catalog_timeout_secs),
            require_catalog: parse_bool(
                "CLIPARR_REQUIRE_CATALOG",
                get("CLIPARR_REQUIRE_CATALOG"),
                true,
            )?,
            bind_addr,
            db_path: get("CLIPARR_DB").unwrap_or_else(|| "data/cliparr.db".to_string()),
            default_import_mode,
            default_polling_interval_secs,
            stop_timeout: Duration::from_secs(stop_timeout_secs),
            static_dir: get("CLIPARR_STATIC_DIR").map(PathBuf::from),
            log_format,
        })
    }

    pub fn settings_defaults(&self) -> SettingsDefaults {
        SettingsDefaults {
            import_mode: self.default_import_mode,
            polling_interval_secs: self.default_polling_interval_secs,
        }
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_var<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(var, &raw, &e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(var: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(var, &v, "expected true or false")),
        },
    }
}

//! services/web/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::NaiveDate;
use nebulearn_core::CalendarWindow;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Browser local storage typically allows about 5 MiB per origin.
pub const DEFAULT_STORAGE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// JSON file backing the key-value store. In-memory storage when `None`.
    pub storage_path: Option<PathBuf>,
    pub storage_quota_bytes: usize,
    pub login_delay: Duration,
    pub fetch_delay: Duration,
    pub calendar: CalendarWindow,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address: SocketAddr = parse_var("BIND_ADDRESS", "127.0.0.1:3000")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Storage ---
        let storage_path = std::env::var("STORAGE_PATH").ok().map(PathBuf::from);
        let storage_quota_bytes: usize =
            parse_var("STORAGE_QUOTA_BYTES", &DEFAULT_STORAGE_QUOTA_BYTES.to_string())?;

        // --- Simulated latency ---
        let login_delay = Duration::from_millis(parse_var("LOGIN_DELAY_MS", "500")?);
        let fetch_delay = Duration::from_millis(parse_var("FETCH_DELAY_MS", "1000")?);

        // --- Progress calendar ---
        let calendar_start: NaiveDate = parse_var("CALENDAR_START", "2025-06-01")?;
        let calendar_days: u32 = parse_var("CALENDAR_DAYS", "15")?;
        if calendar_days == 0 {
            return Err(ConfigError::InvalidValue(
                "CALENDAR_DAYS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            log_level,
            storage_path,
            storage_quota_bytes,
            login_delay,
            fetch_delay,
            calendar: CalendarWindow::new(calendar_start, calendar_days),
        })
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

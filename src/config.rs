//! Runtime configuration read from the process environment.
//!
//! `DATABASE_URL` is mandatory; every other value has a default matching the
//! public Open-Meteo endpoints and the Brasília time zone.

use crate::error::{AppError, Result};
use chrono::NaiveDate;
use std::env;
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";
pub const DEFAULT_HISTORICAL_START: &str = "2025-01-01";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Settings shared by both ETL stages.
#[derive(Debug, Clone)]
pub struct Settings {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Endpoint used in forecast mode.
    pub forecast_url: String,
    /// Endpoint used in historical (backfill) mode.
    pub archive_url: String,
    /// Time-zone convention the API aggregates daily values in.
    pub timezone: String,
    /// First date requested in historical mode.
    pub historical_start: NaiveDate,
    /// Bound on each individual weather API request.
    pub http_timeout: Duration,
}

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigMissing` when `DATABASE_URL` is unset or empty, and
    /// `AppError::Config` when an optional value cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from any key lookup. `from_env` is this over `std::env`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or_else(|| {
            error!("DATABASE_URL is not set; refusing to start");
            AppError::ConfigMissing("DATABASE_URL".to_string())
        })?;

        let historical_start = match get("WEATHER_HISTORICAL_START") {
            Some(raw) => parse_date("WEATHER_HISTORICAL_START", &raw)?,
            None => parse_date("WEATHER_HISTORICAL_START", DEFAULT_HISTORICAL_START)?,
        };

        let timeout_secs = match get("WEATHER_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(AppError::Config(format!(
                        "WEATHER_HTTP_TIMEOUT_SECS must be a positive integer, got '{}'",
                        raw
                    )))
                },
            },
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let settings = Self {
            database_url,
            forecast_url: get("WEATHER_FORECAST_URL")
                .unwrap_or_else(|| DEFAULT_FORECAST_URL.to_string()),
            archive_url: get("WEATHER_ARCHIVE_URL")
                .unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string()),
            timezone: get("WEATHER_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            historical_start,
            http_timeout: Duration::from_secs(timeout_secs),
        };
        debug!(
            "Loaded settings: forecast={} archive={} timezone={} start={} timeout={:?}",
            settings.forecast_url,
            settings.archive_url,
            settings.timezone,
            settings.historical_start,
            settings.http_timeout
        );
        Ok(settings)
    }
}

fn parse_date(key: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| AppError::Config(format!("{} must be YYYY-MM-DD, got '{}': {}", key, raw, e)))
}

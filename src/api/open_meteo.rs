//! Provides a client for the Open-Meteo forecast and archive APIs.
//!
//! This module defines the `OpenMeteoClient` struct, which requests daily maximum
//! temperature, minimum temperature and precipitation sum for a region's coordinates.

use super::WeatherSource;
use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::models::{DailyValues, ExtractionMode, OpenMeteoResponse, Region};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use tracing::{debug, error, info};

/// Daily variables requested in both modes.
pub const DAILY_VARIABLES: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum";

/// An asynchronous client for fetching daily data from Open-Meteo.
pub struct OpenMeteoClient {
    client: Client,
    forecast_url: String,
    archive_url: String,
    timezone: String,
    historical_start: NaiveDate,
}

impl OpenMeteoClient {
    /// Creates a new `OpenMeteoClient` from the loaded settings.
    ///
    /// The HTTP client carries the per-request timeout, so one unresponsive
    /// region delays a run by at most that bound.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.http_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            forecast_url: settings.forecast_url.clone(),
            archive_url: settings.archive_url.clone(),
            timezone: settings.timezone.clone(),
            historical_start: settings.historical_start,
        })
    }

    fn endpoint(&self, mode: ExtractionMode) -> &str {
        match mode {
            ExtractionMode::Forecast => &self.forecast_url,
            ExtractionMode::Historical => &self.archive_url,
        }
    }

    /// Query parameters for one request. `today` bounds the historical range.
    pub(crate) fn query(
        &self,
        region: &Region,
        mode: ExtractionMode,
        today: NaiveDate,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("latitude", region.latitude.to_string()),
            ("longitude", region.longitude.to_string()),
            ("daily", DAILY_VARIABLES.to_string()),
            ("timezone", self.timezone.clone()),
        ];
        if mode == ExtractionMode::Historical {
            query.push(("start_date", self.historical_start.to_string()));
            query.push(("end_date", today.to_string()));
        }
        query
    }

    /// Fetches daily values for one region.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Api` on network failure, timeout or a non-success status,
    /// and `AppError::MalformedResponse` when the body is not the expected daily structure.
    pub async fn get_daily(&self, region: &Region, mode: ExtractionMode) -> Result<Vec<DailyValues>> {
        let today = Local::now().date_naive();
        let url = self.endpoint(mode);
        info!("Fetching {} data for region: {}", mode, region.name);

        let response = self
            .client
            .get(url)
            .query(&self.query(region, mode, today))
            .send()
            .await
            .map_err(|e| {
                error!("Error fetching {} data for {}: {}", mode, region.name, e);
                AppError::Api(e.into())
            })?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                error!(
                    "API request for {} failed with status {}: {}",
                    region.name,
                    e.status().unwrap_or_default(),
                    e
                );
                return Err(AppError::Api(e.into()));
            },
        };

        let body = response.bytes().await.map_err(|e| {
            error!("Error reading API response body for {}: {}", region.name, e);
            AppError::Api(e.into())
        })?;

        let parsed: OpenMeteoResponse = serde_json::from_slice(&body).map_err(|e| {
            error!("Unexpected API response shape for {}: {}", region.name, e);
            AppError::MalformedResponse(format!("{}: {}", region.name, e))
        })?;

        let days = parsed.daily.into_days()?;
        debug!("Received {} days for {}", days.len(), region.name);
        Ok(days)
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn fetch_daily(&self, region: &Region, mode: ExtractionMode) -> Result<Vec<DailyValues>> {
        self.get_daily(region, mode).await
    }
}

//! Provides a scripted `WeatherSource` for exercising the extraction service
//! without touching the network.
//!
//! Each region is given either a list of daily values or a failure. Regions with
//! no script behave like an unreachable endpoint. Every call is recorded so tests
//! can check ordering and that failed regions were still attempted.

use super::WeatherSource;
use crate::error::{AppError, Result};
use crate::models::{DailyValues, ExtractionMode, Region};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

enum Script {
    Days(Vec<DailyValues>),
    Fail(AppError),
}

#[derive(Default)]
pub struct MockWeatherSource {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<(String, ExtractionMode)>>,
}

impl MockWeatherSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful response for `region`.
    pub fn respond(&self, region: &str, days: Vec<DailyValues>) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(region.to_string(), Script::Days(days));
        self
    }

    /// Scripts a failure for `region`, as a timeout or a 500 would surface.
    pub fn fail(&self, region: &str, reason: &str) -> &Self {
        self.scripts.lock().unwrap().insert(
            region.to_string(),
            Script::Fail(AppError::MalformedResponse(reason.to_string())),
        );
        self
    }

    pub fn calls(&self) -> Vec<(String, ExtractionMode)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherSource for MockWeatherSource {
    async fn fetch_daily(&self, region: &Region, mode: ExtractionMode) -> Result<Vec<DailyValues>> {
        debug!("Mock fetch for {} ({})", region.name, mode);
        self.calls
            .lock()
            .unwrap()
            .push((region.name.to_string(), mode));

        match self.scripts.lock().unwrap().get(region.name) {
            Some(Script::Days(days)) => Ok(days.clone()),
            Some(Script::Fail(e)) => Err(e.clone()),
            None => Err(AppError::MalformedResponse(format!(
                "no scripted response for {}",
                region.name
            ))),
        }
    }
}

/// Builds `count` consecutive days starting at `start` with the given metrics.
pub fn days_from(
    start: NaiveDate,
    count: i64,
    temp_max: f64,
    temp_min: f64,
    precip_total: f64,
) -> Vec<DailyValues> {
    (0..count)
        .map(|offset| DailyValues {
            date: start + Duration::days(offset),
            temp_max: Some(temp_max),
            temp_min: Some(temp_min),
            precip_total: Some(precip_total),
        })
        .collect()
}

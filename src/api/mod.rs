//! Provides clients and utilities for interacting with external APIs.
//!
//! Includes:
//! - `WeatherSource`: the capability the extraction service depends on.
//! - `open_meteo`: Client for the real Open-Meteo API.
//! - `mock`: A scripted source for tests (test builds only).

#[cfg(test)]
mod mock;
mod open_meteo;
#[cfg(test)]
mod open_meteo_test;

#[cfg(test)]
pub use mock::*;
pub use open_meteo::*;

use crate::error::Result;
use crate::models::{DailyValues, ExtractionMode, Region};
use async_trait::async_trait;

/// Something that can produce daily metrics for a region.
///
/// Any error returned here is a per-region failure: the caller logs it and moves on.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetches one value per day for `region`, already validated for shape.
    async fn fetch_daily(&self, region: &Region, mode: ExtractionMode) -> Result<Vec<DailyValues>>;
}

//! Defines the weather data structures flowing through the pipeline.
//!
//! Includes structs for:
//! - Deserializing Open-Meteo daily responses (`OpenMeteoResponse`, `DailyBlock`).
//! - The versioned raw payload landed by extraction (`RawPayload`, `RawObservation`).
//! - The curated daily row produced by transformation (`DailyObservation`).

use crate::error::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Which Open-Meteo endpoint an extraction run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExtractionMode {
    /// Current multi-day forecast.
    Forecast,
    /// Bounded archive range from the configured start date through today, for backfill.
    Historical,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Forecast => write!(f, "forecast"),
            ExtractionMode::Historical => write!(f, "historical"),
        }
    }
}

// --- Open-Meteo API Response Structs ---

/// Top-level Open-Meteo response. Only the `daily` block is consumed.
#[derive(Debug, Deserialize, Clone)]
pub struct OpenMeteoResponse {
    pub daily: DailyBlock,
}

/// Parallel arrays of dates and daily metrics. Metric elements may be `null`.
#[derive(Debug, Deserialize, Clone)]
pub struct DailyBlock {
    pub time: Vec<NaiveDate>,
    pub temperature_2m_max: Vec<Option<f64>>,
    pub temperature_2m_min: Vec<Option<f64>>,
    pub precipitation_sum: Vec<Option<f64>>,
}

impl DailyBlock {
    /// Zips the parallel arrays into one value per date.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MalformedResponse` if any metric array does not have
    /// exactly one element per date.
    pub fn into_days(self) -> Result<Vec<DailyValues>> {
        let dates = self.time.len();
        let lengths = [
            ("temperature_2m_max", self.temperature_2m_max.len()),
            ("temperature_2m_min", self.temperature_2m_min.len()),
            ("precipitation_sum", self.precipitation_sum.len()),
        ];
        for (field, len) in lengths {
            if len != dates {
                return Err(AppError::MalformedResponse(format!(
                    "daily.{} has {} values for {} dates",
                    field, len, dates
                )));
            }
        }

        Ok(self
            .time
            .into_iter()
            .zip(self.temperature_2m_max)
            .zip(self.temperature_2m_min)
            .zip(self.precipitation_sum)
            .map(|(((date, temp_max), temp_min), precip_total)| DailyValues {
                date,
                temp_max,
                temp_min,
                precip_total,
            })
            .collect())
    }
}

/// One day of metrics for one region as returned by a `WeatherSource`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyValues {
    pub date: NaiveDate,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub precip_total: Option<f64>,
}

// --- Raw Payload ---

/// Version written by this build. Payloads without a version field decode as version 1.
pub const PAYLOAD_VERSION: u32 = 1;

const LEGACY_VERSION: u32 = 1;

/// A numeric metric decoded with coerce-or-null semantics.
///
/// Finite JSON numbers and strings holding a finite float become a value; null,
/// missing fields and anything non-numeric become absent instead of failing the decode.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metric(Option<f64>);

impl Metric {
    pub fn new(value: Option<f64>) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }

    pub fn coerce(value: &Value) -> Self {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Self(number.filter(|v| v.is_finite()))
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl Metric {
    /// Coerces a metric straight from its JSON text. Numbers are parsed here
    /// rather than by the JSON lexer, so one that overflows `f64` becomes
    /// infinite and then absent instead of failing the whole payload.
    pub fn from_raw(raw: &RawValue) -> Self {
        let text = raw.get().trim();
        if text.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
            return Self(text.parse::<f64>().ok().filter(|v| v.is_finite()));
        }
        serde_json::from_str::<Value>(text)
            .map(|value| Self::coerce(&value))
            .unwrap_or_default()
    }
}

/// The opaque blob stored per (region, date) in the raw store.
///
/// Field names match the Open-Meteo daily variables so rows landed by older
/// writers keep decoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawPayload {
    pub version: u32,
    pub temperature_2m_max: Metric,
    pub temperature_2m_min: Metric,
    pub precipitation_sum: Metric,
}

impl RawPayload {
    pub fn new(temp_max: Option<f64>, temp_min: Option<f64>, precip_total: Option<f64>) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            temperature_2m_max: Metric::new(temp_max),
            temperature_2m_min: Metric::new(temp_min),
            precipitation_sum: Metric::new(precip_total),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a stored blob. Fails only when the blob is not a payload object at
    /// all or carries a version newer than this build understands.
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, serde_json::Error> {
        // A map only deserializes from a JSON object; arrays, scalars and null are rejected.
        let fields: BTreeMap<String, Box<RawValue>> = serde_json::from_slice(bytes)?;

        let version = match fields.get("version") {
            Some(raw) => serde_json::from_str::<u32>(raw.get())?,
            None => LEGACY_VERSION,
        };
        if version > PAYLOAD_VERSION {
            return Err(<serde_json::Error as serde::de::Error>::custom(format!(
                "unsupported payload version {}",
                version
            )));
        }

        let metric = |name: &str| {
            fields
                .get(name)
                .map_or_else(Metric::default, |raw| Metric::from_raw(raw))
        };
        Ok(Self {
            version,
            temperature_2m_max: metric("temperature_2m_max"),
            temperature_2m_min: metric("temperature_2m_min"),
            precipitation_sum: metric("precipitation_sum"),
        })
    }
}

impl From<&DailyValues> for RawPayload {
    fn from(day: &DailyValues) -> Self {
        RawPayload::new(day.temp_max, day.temp_min, day.precip_total)
    }
}

/// A row of the raw store (`weather_raw`). Primary key `(region, date)`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RawObservation {
    pub region: String,
    pub date: NaiveDate,
    pub payload: Vec<u8>,
}

impl RawObservation {
    pub fn new(region: impl Into<String>, date: NaiveDate, payload: &RawPayload) -> Result<Self> {
        Ok(Self {
            region: region.into(),
            date,
            payload: payload.encode()?,
        })
    }

    /// Decodes the payload, tagging failures with the row key.
    pub fn decode_payload(&self) -> Result<RawPayload> {
        RawPayload::decode(&self.payload).map_err(|e| {
            AppError::PayloadDecode(format!("{} on {}: {}", self.region, self.date, e))
        })
    }
}

// --- Curated Structs ---

/// A row of the curated store (`weather_daily`). Primary key `(region, date)`.
///
/// `thermal_amplitude` is always `temp_max - temp_min`; the only constructors compute it.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DailyObservation {
    pub region: String,
    pub date: NaiveDate,
    pub temp_max: f64,
    pub temp_min: f64,
    pub precip_total: f64,
    pub thermal_amplitude: f64,
}

impl DailyObservation {
    pub fn new(
        region: impl Into<String>,
        date: NaiveDate,
        temp_max: f64,
        temp_min: f64,
        precip_total: f64,
    ) -> Self {
        Self {
            region: region.into(),
            date,
            temp_max,
            temp_min,
            precip_total,
            thermal_amplitude: temp_max - temp_min,
        }
    }

    /// Builds the curated row, or `None` when any of the three metrics is absent.
    pub fn from_payload(region: &str, date: NaiveDate, payload: &RawPayload) -> Option<Self> {
        let (Some(temp_max), Some(temp_min), Some(precip_total)) = (
            payload.temperature_2m_max.value(),
            payload.temperature_2m_min.value(),
            payload.precipitation_sum.value(),
        ) else {
            return None;
        };
        Some(Self::new(region, date, temp_max, temp_min, precip_total))
    }
}

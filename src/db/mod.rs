//! Provides database interaction functionalities.
//!
//! The ETL services depend only on the repository traits defined here. The
//! PostgreSQL implementation lives in `postgres`; `memory` provides in-process
//! fakes for tests.

#[cfg(test)]
mod memory;
mod postgres;

#[cfg(test)]
pub use memory::*;
pub use postgres::*;

use crate::error::Result;
use crate::models::{DailyObservation, RawObservation};
use async_trait::async_trait;

/// Read/write access to the raw landing table.
#[async_trait]
pub trait RawRepository: Send + Sync {
    /// Opens a write scope. Nothing written through it is visible until `commit`.
    async fn begin(&self) -> Result<Box<dyn RawWriter>>;

    /// Returns every raw row currently stored.
    async fn fetch_all(&self) -> Result<Vec<RawObservation>>;
}

/// A transactional write scope over the raw table.
///
/// Dropping a writer without committing discards everything upserted through it.
#[async_trait]
pub trait RawWriter: Send {
    /// Inserts the row, or overwrites the payload if `(region, date)` already exists.
    async fn upsert(&mut self, observation: &RawObservation) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Read/write access to the curated daily table.
#[async_trait]
pub trait CuratedRepository: Send + Sync {
    /// Upserts every row in one transaction: all rows are written or none are.
    /// Existing rows with the same `(region, date)` are fully overwritten.
    async fn upsert_all(&self, rows: &[DailyObservation]) -> Result<()>;

    /// Reads the curated table back. The reporting layer queries it directly, so
    /// only the tests go through this.
    #[cfg(test)]
    async fn fetch_all(&self) -> Result<Vec<DailyObservation>>;
}

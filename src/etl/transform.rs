//! Transformation: rebuild curated daily rows from the whole raw store.

use crate::db::{CuratedRepository, RawRepository};
use crate::error::Result;
use crate::models::DailyObservation;
use tracing::{debug, error, info, warn};

/// Summary of a transformation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// Raw rows read in the full scan.
    pub raw_rows: usize,
    /// Rows dropped because at least one metric was missing or non-numeric.
    pub dropped_rows: usize,
    /// Curated rows written in the batch.
    pub upserted_rows: usize,
}

/// Reads every raw row, keeps only fully numeric days and upserts them as one batch.
///
/// There is no watermark: each run reprocesses the entire raw store. A payload
/// that cannot be decoded at all aborts the run before anything is written, so
/// the curated store is left exactly as it was.
pub struct TransformationService<'a, R: ?Sized, C: ?Sized> {
    raw: &'a R,
    curated: &'a C,
}

impl<'a, R, C> TransformationService<'a, R, C>
where
    R: RawRepository + ?Sized,
    C: CuratedRepository + ?Sized,
{
    pub fn new(raw: &'a R, curated: &'a C) -> Self {
        Self { raw, curated }
    }

    pub async fn run(&self) -> Result<TransformReport> {
        info!("Starting transformation of raw weather data");

        let raw_rows = self.raw.fetch_all().await?;
        if raw_rows.is_empty() {
            warn!("Raw store is empty; nothing to transform");
            return Ok(TransformReport::default());
        }

        let mut report = TransformReport {
            raw_rows: raw_rows.len(),
            ..TransformReport::default()
        };
        let mut curated = Vec::with_capacity(raw_rows.len());

        for row in &raw_rows {
            let payload = row.decode_payload().map_err(|e| {
                error!("Aborting transformation: {}", e);
                e
            })?;
            match DailyObservation::from_payload(&row.region, row.date, &payload) {
                Some(observation) => curated.push(observation),
                None => {
                    debug!(
                        "Dropping {} on {}: missing or non-numeric metric",
                        row.region, row.date
                    );
                    report.dropped_rows += 1;
                },
            }
        }

        if curated.is_empty() {
            warn!(
                "No valid rows after transformation ({} raw rows, all dropped)",
                report.raw_rows
            );
            return Ok(report);
        }

        self.curated.upsert_all(&curated).await?;
        report.upserted_rows = curated.len();

        info!(
            "Transformation complete: {} raw rows, {} dropped, {} upserted",
            report.raw_rows, report.dropped_rows, report.upserted_rows
        );
        Ok(report)
    }
}

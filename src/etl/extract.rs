//! Extraction: fetch every region's daily values and land them in the raw store.

use crate::api::WeatherSource;
use crate::db::RawRepository;
use crate::error::Result;
use crate::models::{ExtractionMode, RawObservation, RawPayload, Region};
use indicatif::ProgressBar;
use tracing::{error, info, warn};

/// What happened to one region during an extraction run.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionOutcome {
    /// The region's days were upserted into the run's write scope.
    Landed { region: String, days: usize },
    /// The weather source failed for this region; nothing was written for it.
    Failed { region: String, reason: String },
}

impl RegionOutcome {
    pub fn region(&self) -> &str {
        match self {
            RegionOutcome::Landed { region, .. } | RegionOutcome::Failed { region, .. } => {
                region.as_str()
            },
        }
    }
}

/// Summary of a committed extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub mode: ExtractionMode,
    pub outcomes: Vec<RegionOutcome>,
}

impl ExtractionReport {
    pub fn landed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RegionOutcome::Landed { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.landed_count()
    }

    pub fn rows_written(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                RegionOutcome::Landed { days, .. } => *days,
                RegionOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}

/// Runs one extraction over a fixed list of regions.
///
/// Regions are processed strictly one after another. A weather source error is
/// recorded as a `Failed` outcome and the loop continues; a raw store error ends
/// the run and, because the writer is dropped uncommitted, discards every write
/// made during it.
pub struct ExtractionService<'a, S: ?Sized, R: ?Sized> {
    source: &'a S,
    raw: &'a R,
    regions: Vec<Region>,
    progress: ProgressBar,
}

impl<'a, S, R> ExtractionService<'a, S, R>
where
    S: WeatherSource + ?Sized,
    R: RawRepository + ?Sized,
{
    pub fn new(source: &'a S, raw: &'a R, regions: Vec<Region>) -> Self {
        Self {
            source,
            raw,
            regions,
            progress: ProgressBar::hidden(),
        }
    }

    /// Reports per-region progress on `progress` instead of a hidden bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        progress.set_length(self.regions.len() as u64);
        self.progress = progress;
        self
    }

    pub async fn run(&self, mode: ExtractionMode) -> Result<ExtractionReport> {
        info!(
            "Starting {} extraction for {} regions",
            mode,
            self.regions.len()
        );

        let mut writer = self.raw.begin().await?;
        let mut outcomes = Vec::with_capacity(self.regions.len());

        for region in &self.regions {
            self.progress.set_message(region.name);

            let outcome = match self.source.fetch_daily(region, mode).await {
                Ok(days) => {
                    for day in &days {
                        let row = RawObservation::new(region.name, day.date, &RawPayload::from(day))?;
                        writer.upsert(&row).await?;
                    }
                    info!("Landed {} raw days for {}", days.len(), region.name);
                    RegionOutcome::Landed {
                        region: region.name.to_string(),
                        days: days.len(),
                    }
                },
                Err(e) => {
                    error!("Extraction failed for {}: {}", region.name, e);
                    RegionOutcome::Failed {
                        region: region.name.to_string(),
                        reason: e.to_string(),
                    }
                },
            };

            outcomes.push(outcome);
            self.progress.inc(1);
        }

        writer.commit().await?;
        self.progress.finish_and_clear();

        let report = ExtractionReport { mode, outcomes };
        if report.failed_count() > 0 {
            warn!(
                "{} extraction finished with {} of {} regions failed",
                mode,
                report.failed_count(),
                report.outcomes.len()
            );
        }
        info!(
            "{} extraction committed {} raw rows from {} regions",
            mode,
            report.rows_written(),
            report.landed_count()
        );
        Ok(report)
    }
}

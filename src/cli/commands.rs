use crate::api::OpenMeteoClient;
use crate::config::Settings;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::etl::{
    ExtractionReport, ExtractionService, RegionOutcome, TransformReport, TransformationService,
};
use crate::models::{find_region, ExtractionMode, Region, REGIONS};
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Daily weather ETL for the Federal District regions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Runs the interactive menu when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Initialize the database schema
    InitDb,

    /// Fetch daily weather for every region and land it in the raw table
    Extract {
        /// forecast for the upcoming days, historical to backfill from the configured start date
        #[arg(short, long, value_enum, default_value_t = ExtractionMode::Forecast)]
        mode: ExtractionMode,

        /// Restrict the run to these regions (repeatable); all regions when omitted
        #[arg(short, long = "region")]
        regions: Vec<String>,
    },

    /// Rebuild the curated daily table from the raw table
    Transform,
}

/// CLI application: loaded settings plus the live database and weather client.
pub struct App {
    db: Database,
    weather: OpenMeteoClient,
}

impl App {
    /// Creates the application from the environment.
    ///
    /// Configuration is validated before any connection is attempted, so a missing
    /// `DATABASE_URL` ends the run with no work done.
    pub async fn new() -> Result<Self> {
        let settings = Settings::from_env()?;
        let weather = OpenMeteoClient::new(&settings)?;
        let db = Database::new(&settings.database_url).await?;
        Ok(Self { db, weather })
    }

    pub async fn run_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::InitDb => {
                self.db.init_schema().await?;
                println!("{}", "Database schema is ready.".green());
            },
            Commands::Extract { mode, regions } => {
                let regions = select_regions(&regions)?;
                let report = self.run_extraction(mode, regions).await?;
                println!("{}", render_extraction_report(&report));
            },
            Commands::Transform => {
                let report = self.run_transformation().await?;
                println!("{}", render_transform_report(&report));
            },
        }
        Ok(())
    }

    /// Runs one extraction over `regions`.
    pub async fn run_extraction(
        &self,
        mode: ExtractionMode,
        regions: Vec<Region>,
    ) -> Result<ExtractionReport> {
        self.db.init_schema().await?;
        let progress = ProgressBar::new(regions.len() as u64);
        progress.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:35.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
        );

        ExtractionService::new(&self.weather, &self.db, regions)
            .with_progress(progress)
            .run(mode)
            .await
    }

    /// Runs one transformation over the full raw table.
    pub async fn run_transformation(&self) -> Result<TransformReport> {
        self.db.init_schema().await?;
        TransformationService::new(&self.db, &self.db).run().await
    }
}

/// Resolves region names against the catalog. No names selects the whole catalog.
pub fn select_regions(names: &[String]) -> Result<Vec<Region>> {
    if names.is_empty() {
        return Ok(REGIONS.to_vec());
    }
    names
        .iter()
        .map(|name| {
            find_region(name).ok_or_else(|| {
                AppError::Cli(format!(
                    "Unknown region '{}'. Must be one of: {:?}",
                    name,
                    REGIONS.iter().map(|r| r.name).collect::<Vec<_>>()
                ))
            })
        })
        .collect()
}

/// Entries of the interactive menu, in display order.
pub const MENU_OPTIONS: [&str; 5] = [
    "Initialize Database Schema",
    "Extract Forecast Data",
    "Backfill Historical Data",
    "Transform Raw Data",
    "Exit",
];

/// Maps a menu selection to a command. `None` means exit.
pub fn menu_command(selection: usize) -> Option<Commands> {
    match selection {
        0 => Some(Commands::InitDb),
        1 => Some(Commands::Extract {
            mode: ExtractionMode::Forecast,
            regions: Vec::new(),
        }),
        2 => Some(Commands::Extract {
            mode: ExtractionMode::Historical,
            regions: Vec::new(),
        }),
        3 => Some(Commands::Transform),
        _ => None,
    }
}

pub fn render_extraction_report(report: &ExtractionReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Region", "Status", "Days / Reason"]);

    for outcome in &report.outcomes {
        let (status, detail) = match outcome {
            RegionOutcome::Landed { days, .. } => {
                (Cell::new("landed").fg(Color::Green), Cell::new(days))
            },
            RegionOutcome::Failed { reason, .. } => {
                (Cell::new("failed").fg(Color::Red), Cell::new(reason))
            },
        };
        table.add_row(vec![Cell::new(outcome.region()), status, detail]);
    }

    info!(
        "{} extraction: {} landed, {} failed, {} rows",
        report.mode,
        report.landed_count(),
        report.failed_count(),
        report.rows_written()
    );
    table
}

pub fn render_transform_report(report: &TransformReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Raw rows", "Dropped", "Upserted"])
        .add_row(vec![
            Cell::new(report.raw_rows),
            Cell::new(report.dropped_rows).fg(if report.dropped_rows > 0 {
                Color::Yellow
            } else {
                Color::Reset
            }),
            Cell::new(report.upserted_rows),
        ]);
    table
}

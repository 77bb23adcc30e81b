//! Provides PostgreSQL database interaction functionalities using `sqlx`.
//!
//! Includes capabilities for establishing connection pools, initializing the database schema,
//! and implementing the raw and curated repositories with upsert semantics.
//! Also contains integration tests for database operations (requires the `integration-tests` feature).

use super::{CuratedRepository, RawRepository, RawWriter};
use crate::error::{AppError, Result};
use crate::models::{DailyObservation, RawObservation};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres, Transaction};
use tracing::{debug, error, info};

/// Represents the database connection pool and provides methods for database operations.
///
/// Holds a `sqlx::Pool` for efficient connection management. Implements both
/// `RawRepository` and `CuratedRepository`.
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    /// Creates a new `Database` instance by establishing a connection pool.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the connection pool cannot be established.
    pub async fn new(database_url: &str) -> Result<Self> {
        info!("Connecting to database...");

        // Both jobs are sequential; a small pool is enough.
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                AppError::Db(e.into())
            })?;

        info!("Database connection pool established.");
        Ok(Self { pool })
    }

    /// Initializes the database schema by creating the raw and curated tables.
    ///
    /// Uses `CREATE TABLE IF NOT EXISTS` and `CREATE INDEX IF NOT EXISTS` so it can
    /// be run before every job.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if any SQL query fails during schema creation.
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema (if necessary)...");

        // Landing table: one opaque payload per region and day.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS weather_raw (
                region TEXT NOT NULL,
                date DATE NOT NULL,
                payload BYTEA NOT NULL,
                PRIMARY KEY (region, date)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create weather_raw table: {}", e);
            AppError::Db(e.into())
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS weather_daily (
                region TEXT NOT NULL,
                date DATE NOT NULL,
                temp_max DOUBLE PRECISION NOT NULL,
                temp_min DOUBLE PRECISION NOT NULL,
                precip_total DOUBLE PRECISION NOT NULL,
                thermal_amplitude DOUBLE PRECISION NOT NULL,
                PRIMARY KEY (region, date)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create weather_daily table: {}", e);
            AppError::Db(e.into())
        })?;

        // Reporting filters by month across all regions.
        sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_weather_daily_date ON weather_daily(date)"#)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to create date index: {}", e);
                AppError::Db(e.into())
            })?;

        info!("Database schema initialized successfully");
        Ok(())
    }
}

/// Raw-table write scope backed by one PostgreSQL transaction.
///
/// `sqlx` rolls the transaction back when it is dropped uncommitted.
pub struct PgRawWriter {
    tx: Transaction<'static, Postgres>,
    written: usize,
}

#[async_trait]
impl RawWriter for PgRawWriter {
    async fn upsert(&mut self, observation: &RawObservation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO weather_raw (region, date, payload)
            VALUES ($1, $2, $3)
            ON CONFLICT (region, date) DO UPDATE SET payload = EXCLUDED.payload
            "#,
        )
        .bind(&observation.region)
        .bind(observation.date)
        .bind(&observation.payload)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            error!(
                "Failed to upsert raw row {} / {}: {}",
                observation.region, observation.date, e
            );
            AppError::Db(e.into())
        })?;
        self.written += 1;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let PgRawWriter { tx, written } = *self;
        tx.commit().await.map_err(|e| {
            error!("Failed to commit raw transaction: {}", e);
            AppError::Db(e.into())
        })?;
        debug!("Committed {} raw upserts", written);
        Ok(())
    }
}

#[async_trait]
impl RawRepository for Database {
    async fn begin(&self) -> Result<Box<dyn RawWriter>> {
        let tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin database transaction: {}", e);
            AppError::Db(e.into())
        })?;
        Ok(Box::new(PgRawWriter { tx, written: 0 }))
    }

    async fn fetch_all(&self) -> Result<Vec<RawObservation>> {
        let rows = sqlx::query_as::<_, RawObservation>(
            "SELECT region, date, payload FROM weather_raw ORDER BY region, date",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to read weather_raw: {}", e);
            AppError::Db(e.into())
        })?;
        debug!("Read {} raw rows", rows.len());
        Ok(rows)
    }
}

#[async_trait]
impl CuratedRepository for Database {
    async fn upsert_all(&self, rows: &[DailyObservation]) -> Result<()> {
        if rows.is_empty() {
            debug!("No curated rows provided for upsert.");
            return Ok(());
        }

        info!("Upserting {} curated rows...", rows.len());

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin database transaction: {}", e);
            AppError::Db(e.into())
        })?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO weather_daily
                (region, date, temp_max, temp_min, precip_total, thermal_amplitude)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (region, date) DO UPDATE SET
                    temp_max = EXCLUDED.temp_max,
                    temp_min = EXCLUDED.temp_min,
                    precip_total = EXCLUDED.precip_total,
                    thermal_amplitude = EXCLUDED.thermal_amplitude
                "#,
            )
            .bind(&row.region)
            .bind(row.date)
            .bind(row.temp_max)
            .bind(row.temp_min)
            .bind(row.precip_total)
            .bind(row.thermal_amplitude)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // The transaction is rolled back when `tx` is dropped.
                error!("Failed to upsert curated row {} / {}: {}", row.region, row.date, e);
                AppError::Db(e.into())
            })?;
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit database transaction: {}", e);
            AppError::Db(e.into())
        })?;

        info!("Successfully upserted {} curated rows", rows.len());
        Ok(())
    }

    #[cfg(test)]
    async fn fetch_all(&self) -> Result<Vec<DailyObservation>> {
        sqlx::query_as::<_, DailyObservation>(
            r#"
            SELECT region, date, temp_max, temp_min, precip_total, thermal_amplitude
            FROM weather_daily
            ORDER BY region, date
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to read weather_daily: {}", e);
            AppError::Db(e.into())
        })
    }
}

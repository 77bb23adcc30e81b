//! In-memory repositories with the same transactional behaviour as the
//! PostgreSQL ones, plus fault injection for store-failure tests.

use super::{CuratedRepository, RawRepository, RawWriter};
use crate::error::{AppError, Result};
use crate::models::{DailyObservation, RawObservation};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

type Key = (String, NaiveDate);

fn store_failure() -> AppError {
    AppError::Db(Arc::new(sqlx::Error::PoolTimedOut))
}

#[derive(Default)]
struct RawState {
    rows: BTreeMap<Key, Vec<u8>>,
    /// Upserts allowed before every further upsert fails. `None` means never fail.
    fail_after: Option<usize>,
    upserts: usize,
    commits: usize,
}

/// Raw store kept in a `BTreeMap` keyed by `(region, date)`.
#[derive(Clone, Default)]
pub struct MemoryRawStore {
    state: Arc<Mutex<RawState>>,
}

impl MemoryRawStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes rows directly, bypassing any writer. Used to seed fixtures.
    pub fn seed(&self, rows: impl IntoIterator<Item = RawObservation>) {
        let mut state = self.state.lock().unwrap();
        for row in rows {
            state.rows.insert((row.region, row.date), row.payload);
        }
    }

    /// Makes every upsert after the first `n` of this store's lifetime fail
    /// like a lost database connection.
    pub fn fail_after(&self, n: usize) {
        self.state.lock().unwrap().fail_after = Some(n);
    }

    pub fn snapshot(&self) -> Vec<RawObservation> {
        self.state
            .lock()
            .unwrap()
            .rows
            .iter()
            .map(|((region, date), payload)| RawObservation {
                region: region.clone(),
                date: *date,
                payload: payload.clone(),
            })
            .collect()
    }

    pub fn commits(&self) -> usize {
        self.state.lock().unwrap().commits
    }
}

/// Buffers upserts until `commit`; dropping it discards the buffer.
pub struct MemoryRawWriter {
    state: Arc<Mutex<RawState>>,
    staged: Vec<RawObservation>,
}

#[async_trait]
impl RawWriter for MemoryRawWriter {
    async fn upsert(&mut self, observation: &RawObservation) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            if state.fail_after.is_some_and(|limit| state.upserts >= limit) {
                return Err(store_failure());
            }
            state.upserts += 1;
        }
        self.staged.push(observation.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryRawWriter { state, staged } = *self;
        let mut state = state.lock().unwrap();
        for row in staged {
            state.rows.insert((row.region, row.date), row.payload);
        }
        state.commits += 1;
        Ok(())
    }
}

#[async_trait]
impl RawRepository for MemoryRawStore {
    async fn begin(&self) -> Result<Box<dyn RawWriter>> {
        Ok(Box::new(MemoryRawWriter {
            state: Arc::clone(&self.state),
            staged: Vec::new(),
        }))
    }

    async fn fetch_all(&self) -> Result<Vec<RawObservation>> {
        Ok(self.snapshot())
    }
}

#[derive(Default)]
struct CuratedState {
    rows: BTreeMap<Key, DailyObservation>,
    fail_writes: bool,
    batches: usize,
}

/// Curated store kept in a `BTreeMap` keyed by `(region, date)`.
#[derive(Clone, Default)]
pub struct MemoryCuratedStore {
    state: Arc<Mutex<CuratedState>>,
}

impl MemoryCuratedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, rows: impl IntoIterator<Item = DailyObservation>) {
        let mut state = self.state.lock().unwrap();
        for row in rows {
            state.rows.insert((row.region.clone(), row.date), row);
        }
    }

    pub fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }

    pub fn snapshot(&self) -> Vec<DailyObservation> {
        self.state.lock().unwrap().rows.values().cloned().collect()
    }

    /// Number of successful `upsert_all` calls.
    pub fn batches(&self) -> usize {
        self.state.lock().unwrap().batches
    }
}

#[async_trait]
impl CuratedRepository for MemoryCuratedStore {
    async fn upsert_all(&self, rows: &[DailyObservation]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(store_failure());
        }
        for row in rows {
            state.rows.insert((row.region.clone(), row.date), row.clone());
        }
        state.batches += 1;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<DailyObservation>> {
        Ok(self.snapshot())
    }
}

//! Signal engine: price upserts, moving-average recomputation and idempotent
//! crossover recording.
//!
//! Every write path for a symbol runs under that symbol's lock, so a
//! recomputation always completes before the next upsert or detection on the
//! same symbol starts. Different symbols proceed independently.

use crate::domain::asset::{self, AssetClass};
use crate::domain::crossover;
use crate::domain::error::GekkoError;
use crate::domain::moving_average::recompute_moving_averages;
use crate::domain::price::{
    PricePoint, TimeseriesRecord, merge_into_series, merge_points, validate_points,
};
use crate::domain::settings::SignalSettings;
use crate::domain::signal::{SignalEvent, Timeframe};
use crate::ports::Repository;
use crate::ports::price_port::MovingAverageUpdate;
use crate::ports::signal_port::Recorded;
use chrono::NaiveDate;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Keyed lock table serializing work per symbol.
#[derive(Debug, Default)]
pub struct SymbolLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SymbolLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `symbol`, created on first use.
    pub fn handle(&self, symbol: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Result of ingesting one symbol's batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub symbol: String,
    pub rows_upserted: usize,
    /// Signals on the ingested dates, whether newly created or already stored.
    pub signals: Vec<SignalEvent>,
}

/// One symbol's rows as handed over by an ingestion source.
#[derive(Debug, Clone)]
pub struct SymbolBatch {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub points: Vec<PricePoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<IngestReport>,
    pub failed: Vec<BatchFailure>,
}

pub struct SignalEngine<'a> {
    repo: &'a dyn Repository,
    settings: SignalSettings,
    locks: SymbolLocks,
}

impl<'a> SignalEngine<'a> {
    pub fn new(repo: &'a dyn Repository, settings: SignalSettings) -> Self {
        Self {
            repo,
            settings,
            locks: SymbolLocks::new(),
        }
    }

    /// Merge `points` into the symbol's series, then recompute both moving
    /// averages over the whole history.
    ///
    /// The batch is validated and the new averages computed before anything
    /// is written; prices and averages then land in one atomic write. A batch
    /// that fails either step writes nothing.
    pub fn upsert_price_and_recompute(
        &self,
        symbol: &str,
        points: Vec<PricePoint>,
    ) -> Result<usize, GekkoError> {
        let points = Self::prepare(symbol, points)?;
        let lock = self.locks.handle(symbol);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let averages = self.merged_averages(symbol, &points)?;
        self.repo.write_series(symbol, &points, &averages)
    }

    /// Recompute moving averages for `symbol` without new data.
    pub fn recompute(&self, symbol: &str) -> Result<usize, GekkoError> {
        let lock = self.locks.handle(symbol);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let updates = self.averages_for(self.repo.load_series(symbol)?)?;
        self.repo.write_series(symbol, &[], &updates)?;
        debug!(
            "recomputed moving averages for {} over {} rows",
            symbol,
            updates.len()
        );
        Ok(updates.len())
    }

    /// Detect a crossover at `date` and record it at most once.
    ///
    /// A key that already holds a signal returns that signal without looking at
    /// prices again. Fails with `NotFound` if `date` has no stored price.
    pub fn detect_and_record(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        date: NaiveDate,
    ) -> Result<Option<SignalEvent>, GekkoError> {
        let lock = self.locks.handle(symbol);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.detect_locked(symbol, timeframe, date)
    }

    pub fn record_signal(&self, event: &SignalEvent) -> Result<Recorded, GekkoError> {
        let lock = self.locks.handle(&event.symbol);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.repo.record_signal(event)
    }

    /// Upsert one symbol's batch, then run detection on each ingested date.
    pub fn ingest(
        &self,
        symbol: &str,
        asset_class: AssetClass,
        points: Vec<PricePoint>,
        timeframe: Timeframe,
    ) -> Result<IngestReport, GekkoError> {
        let points = Self::prepare(symbol, points)?;
        let lock = self.locks.handle(symbol);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let averages = self.merged_averages(symbol, &points)?;
        if self.repo.ensure_metadata(&asset::lookup(symbol, asset_class))? {
            debug!("created metadata for {} ({})", symbol, asset_class);
        }

        let rows_upserted = self.repo.write_series(symbol, &points, &averages)?;

        let mut signals = Vec::new();
        for p in &points {
            if let Some(event) = self.detect_locked(symbol, timeframe, p.date)? {
                signals.push(event);
            }
        }

        info!(
            "ingested {}: {} rows, {} signals",
            symbol,
            rows_upserted,
            signals.len()
        );

        Ok(IngestReport {
            symbol: symbol.to_string(),
            rows_upserted,
            signals,
        })
    }

    /// Ingest many symbols. A failing symbol is reported and skipped; the
    /// rest of the batch still runs.
    pub fn ingest_batch(&self, batches: Vec<SymbolBatch>, timeframe: Timeframe) -> BatchReport {
        let mut report = BatchReport::default();

        for batch in batches {
            let symbol = batch.symbol.clone();
            match self.ingest(&batch.symbol, batch.asset_class, batch.points, timeframe) {
                Ok(r) => report.succeeded.push(r),
                Err(e) => {
                    warn!("skipping {} ({})", symbol, e);
                    report.failed.push(BatchFailure {
                        symbol,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Seed metadata for the default tracked universe. Returns rows created.
    pub fn initialize_tracked_symbols(&self) -> Result<usize, GekkoError> {
        let mut created = 0;
        for metadata in asset::tracked_catalog() {
            if self.repo.ensure_metadata(&metadata)? {
                created += 1;
            }
        }
        info!("initialized {} tracked symbols", created);
        Ok(created)
    }

    fn prepare(symbol: &str, points: Vec<PricePoint>) -> Result<Vec<PricePoint>, GekkoError> {
        validate_points(symbol, &points)?;
        Ok(merge_points(points))
    }

    /// Averages for the stored series with `points` merged in.
    fn merged_averages(
        &self,
        symbol: &str,
        points: &[PricePoint],
    ) -> Result<Vec<MovingAverageUpdate>, GekkoError> {
        if points.is_empty() {
            return Ok(Vec::new());
        }
        let series = merge_into_series(self.repo.load_series(symbol)?, points);
        self.averages_for(series)
    }

    fn averages_for(
        &self,
        mut series: Vec<TimeseriesRecord>,
    ) -> Result<Vec<MovingAverageUpdate>, GekkoError> {
        recompute_moving_averages(&mut series, self.settings.windows)?;
        Ok(series
            .iter()
            .map(|r| MovingAverageUpdate {
                date: r.date(),
                ma_short: r.ma_short,
                ma_long: r.ma_long,
            })
            .collect())
    }

    fn detect_locked(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        date: NaiveDate,
    ) -> Result<Option<SignalEvent>, GekkoError> {
        if let Some(existing) = self.repo.find_signal(symbol, timeframe, date)? {
            debug!("signal already recorded for {} {} {}", symbol, timeframe, date);
            return Ok(Some(existing));
        }

        let current = self
            .repo
            .get_record(symbol, date)?
            .ok_or_else(|| GekkoError::NotFound {
                symbol: symbol.to_string(),
                detail: format!("no price on {date}"),
            })?;

        let Some(previous_date) = timeframe.previous_period(date) else {
            return Ok(None);
        };
        let Some(previous) = self.repo.get_record(symbol, previous_date)? else {
            return Ok(None);
        };
        let Some(event) = crossover::detect(&previous, &current, timeframe) else {
            return Ok(None);
        };

        let recorded = self.repo.record_signal(&event)?;
        if recorded.is_created() {
            info!(
                "{} {} on {} ({} short {} / long {})",
                symbol, event.signal_type, date, timeframe, event.ma_short, event.ma_long
            );
        }
        Ok(Some(recorded.into_event()))
    }
}

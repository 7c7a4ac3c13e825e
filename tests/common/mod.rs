#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use gekko_signals::domain::asset::{AssetClass, SymbolMetadata};
use gekko_signals::domain::error::GekkoError;
use gekko_signals::domain::price::{PricePoint, TimeseriesRecord};
use gekko_signals::domain::settings::{MaWindows, SignalSettings};
use gekko_signals::domain::signal::{SignalEvent, SignalKey, Timeframe};
use gekko_signals::ports::metadata_port::MetadataPort;
use gekko_signals::ports::price_port::{MovingAverageUpdate, PricePort};
use gekko_signals::ports::signal_port::{Recorded, SignalFilter, SignalPort};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

/// In-memory repository mirroring the SQLite adapter's semantics.
#[derive(Default)]
pub struct MemoryStore {
    prices: Mutex<BTreeMap<(String, NaiveDate), TimeseriesRecord>>,
    signals: Mutex<BTreeMap<SignalKey, SignalEvent>>,
    metadata: Mutex<BTreeMap<(String, AssetClass), SymbolMetadata>>,
    failing: HashSet<String>,
    failing_averages: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every price write for `symbol` fail with a database error.
    pub fn with_failing_symbol(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    /// Make the moving-average step of every write for `symbol` fail after
    /// its prices have been staged.
    pub fn with_failing_averages(mut self, symbol: &str) -> Self {
        self.failing_averages.insert(symbol.to_string());
        self
    }

    pub fn signal_count(&self) -> usize {
        self.signals.lock().unwrap().len()
    }

    pub fn all_signals(&self) -> Vec<SignalEvent> {
        self.signals.lock().unwrap().values().cloned().collect()
    }
}

impl PricePort for MemoryStore {
    fn write_series(
        &self,
        symbol: &str,
        points: &[PricePoint],
        averages: &[MovingAverageUpdate],
    ) -> Result<usize, GekkoError> {
        if self.failing.contains(symbol) {
            return Err(GekkoError::Database {
                reason: format!("write rejected for {symbol}"),
            });
        }

        let mut prices = self.prices.lock().unwrap();
        let mut staged = prices.clone();
        for p in points {
            let key = (symbol.to_string(), p.date);
            match staged.get_mut(&key) {
                Some(existing) => existing.price = p.clone(),
                None => {
                    staged.insert(key, TimeseriesRecord::from_price(p.clone()));
                }
            }
        }

        for u in averages {
            if self.failing_averages.contains(symbol) {
                return Err(GekkoError::DatabaseQuery {
                    reason: format!("average update rejected for {symbol}"),
                });
            }
            if let Some(record) = staged.get_mut(&(symbol.to_string(), u.date)) {
                record.ma_short = u.ma_short;
                record.ma_long = u.ma_long;
            }
        }

        *prices = staged;
        Ok(points.len())
    }

    fn load_series(&self, symbol: &str) -> Result<Vec<TimeseriesRecord>, GekkoError> {
        self.load_series_since(symbol, NaiveDate::MIN)
    }

    fn load_series_since(
        &self,
        symbol: &str,
        start: NaiveDate,
    ) -> Result<Vec<TimeseriesRecord>, GekkoError> {
        let prices = self.prices.lock().unwrap();
        Ok(prices
            .range((symbol.to_string(), start)..=(symbol.to_string(), NaiveDate::MAX))
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn get_record(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<TimeseriesRecord>, GekkoError> {
        let prices = self.prices.lock().unwrap();
        Ok(prices.get(&(symbol.to_string(), date)).cloned())
    }

    fn latest_records(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<TimeseriesRecord>, GekkoError> {
        let series = self.load_series(symbol)?;
        let skip = series.len().saturating_sub(limit);
        Ok(series.into_iter().skip(skip).collect())
    }

    fn priced_symbols(&self) -> Result<Vec<String>, GekkoError> {
        let prices = self.prices.lock().unwrap();
        let mut symbols: Vec<String> = prices.keys().map(|(s, _)| s.clone()).collect();
        symbols.dedup();
        Ok(symbols)
    }
}

impl SignalPort for MemoryStore {
    fn find_signal(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        signal_date: NaiveDate,
    ) -> Result<Option<SignalEvent>, GekkoError> {
        let key = SignalKey {
            symbol: symbol.to_string(),
            timeframe,
            signal_date,
        };
        Ok(self.signals.lock().unwrap().get(&key).cloned())
    }

    fn record_signal(&self, event: &SignalEvent) -> Result<Recorded, GekkoError> {
        let mut signals = self.signals.lock().unwrap();
        match signals.get(&event.key()) {
            Some(stored) => Ok(Recorded::Existing(stored.clone())),
            None => {
                signals.insert(event.key(), event.clone());
                Ok(Recorded::Created(event.clone()))
            }
        }
    }

    fn signals_since(
        &self,
        since: NaiveDate,
        filter: &SignalFilter,
    ) -> Result<Vec<SignalEvent>, GekkoError> {
        Ok(self
            .signals
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.signal_date >= since)
            .filter(|s| filter.symbol.as_deref().is_none_or(|sym| s.symbol == sym))
            .filter(|s| filter.signal_type.is_none_or(|t| s.signal_type == t))
            .cloned()
            .collect())
    }
}

impl MetadataPort for MemoryStore {
    fn ensure_metadata(&self, metadata: &SymbolMetadata) -> Result<bool, GekkoError> {
        let mut rows = self.metadata.lock().unwrap();
        let key = (metadata.symbol.clone(), metadata.asset_class);
        if rows.contains_key(&key) {
            return Ok(false);
        }
        rows.insert(key, metadata.clone());
        Ok(true)
    }

    fn symbols_in_class(&self, asset_class: AssetClass) -> Result<Vec<String>, GekkoError> {
        Ok(self
            .metadata
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.asset_class == asset_class)
            .map(|m| m.symbol.clone())
            .collect())
    }

    fn all_metadata(&self) -> Result<Vec<SymbolMetadata>, GekkoError> {
        let mut rows: Vec<_> = self.metadata.lock().unwrap().values().cloned().collect();
        rows.sort_by(|a, b| {
            a.asset_class
                .cmp(&b.asset_class)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        Ok(rows)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive points starting at `start`, spaced `step_days` apart.
pub fn make_points(symbol: &str, start: NaiveDate, step_days: u64, closes: &[i64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let date = start
                .checked_add_days(Days::new(i as u64 * step_days))
                .unwrap();
            PricePoint::close_only(symbol, date, Decimal::from(c))
        })
        .collect()
}

pub fn daily_points(symbol: &str, start: NaiveDate, closes: &[i64]) -> Vec<PricePoint> {
    make_points(symbol, start, 1, closes)
}

/// Windows 3/5, daily.
pub fn small_settings() -> SignalSettings {
    SignalSettings {
        windows: MaWindows { short: 3, long: 5 },
        ..SignalSettings::default()
    }
}

/// Falls for six days, then recovers; with 3/5 windows the short average
/// crosses above the long one exactly once, on index 8.
pub const V_SHAPE: [i64; 11] = [20, 19, 18, 17, 16, 15, 16, 17, 18, 19, 20];

/// Mirror image of [`V_SHAPE`]; crosses below once, on index 8.
pub const PEAK_SHAPE: [i64; 11] = [10, 11, 12, 13, 14, 15, 14, 13, 12, 11, 10];

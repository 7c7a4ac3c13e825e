//! Read-side views over stored prices, signals and metadata.
//!
//! All windows are measured back from a fixed "today", taken from the local
//! clock unless the caller pins it with [`SignalQueryService::with_today`].

use crate::domain::asset::AssetClass;
use crate::domain::error::GekkoError;
use crate::domain::price::TimeseriesRecord;
use crate::domain::signal::{SignalEvent, SignalType};
use crate::ports::Repository;
use crate::ports::signal_port::SignalFilter;
use chrono::{NaiveDate, TimeDelta};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolOverview {
    pub symbol: String,
    pub latest: TimeseriesRecord,
    pub trend: Trend,
    pub history: Vec<TimeseriesRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignalSummary {
    pub bullish: usize,
    pub bearish: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendEntry {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_close: Decimal,
    pub end_close: Decimal,
    /// Percentage change, rounded to two decimal places.
    pub change_pct: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trending {
    pub gainers: Vec<TrendEntry>,
    pub losers: Vec<TrendEntry>,
}

pub struct SignalQueryService<'a> {
    repo: &'a dyn Repository,
    today: NaiveDate,
}

impl<'a> SignalQueryService<'a> {
    pub fn new(repo: &'a dyn Repository) -> Self {
        Self::with_today(repo, chrono::Local::now().date_naive())
    }

    pub fn with_today(repo: &'a dyn Repository, today: NaiveDate) -> Self {
        Self { repo, today }
    }

    /// First date inside a `days` window. Negative windows count as zero.
    pub fn cutoff(&self, days: i64) -> NaiveDate {
        TimeDelta::try_days(days.max(0))
            .and_then(|window| self.today.checked_sub_signed(window))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Signals dated within the last `days`, newest first, ties by symbol.
    pub fn recent_signals(
        &self,
        symbol: Option<&str>,
        days: i64,
        signal_type: Option<SignalType>,
    ) -> Result<Vec<SignalEvent>, GekkoError> {
        let filter = SignalFilter {
            symbol: symbol.map(str::to_string),
            signal_type,
        };
        let mut signals = self.repo.signals_since(self.cutoff(days), &filter)?;
        sort_newest_first(&mut signals);
        Ok(signals)
    }

    /// Bullish crossovers, optionally restricted to one asset class.
    pub fn bullish_signals(
        &self,
        days: i64,
        asset_class: Option<AssetClass>,
    ) -> Result<Vec<SignalEvent>, GekkoError> {
        let signals = self.recent_signals(None, days, Some(SignalType::BullishCross))?;
        let Some(class) = asset_class else {
            return Ok(signals);
        };

        let members: HashSet<String> = self.repo.symbols_in_class(class)?.into_iter().collect();
        Ok(signals
            .into_iter()
            .filter(|s| members.contains(&s.symbol))
            .collect())
    }

    pub fn signal_summary(
        &self,
        symbol: Option<&str>,
        days: i64,
    ) -> Result<SignalSummary, GekkoError> {
        let signals = self.recent_signals(symbol, days, None)?;
        let bullish = signals
            .iter()
            .filter(|s| s.signal_type == SignalType::BullishCross)
            .count();
        Ok(SignalSummary {
            bullish,
            bearish: signals.len() - bullish,
            total: signals.len(),
        })
    }

    /// The newest `limit` records for `symbol`, oldest first.
    pub fn latest_timeseries(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<TimeseriesRecord>, GekkoError> {
        self.repo.latest_records(symbol, limit)
    }

    pub fn overview(&self, symbol: &str, days: i64) -> Result<SymbolOverview, GekkoError> {
        let latest = self
            .repo
            .latest_records(symbol, 1)?
            .pop()
            .ok_or_else(|| GekkoError::NotFound {
                symbol: symbol.to_string(),
                detail: "no price data".to_string(),
            })?;

        let history = self.repo.load_series_since(symbol, self.cutoff(days))?;
        let trend = match history.as_slice() {
            [.., prev, last] if last.close() > prev.close() => Trend::Up,
            [.., prev, last] if last.close() < prev.close() => Trend::Down,
            _ => Trend::Flat,
        };

        Ok(SymbolOverview {
            symbol: symbol.to_string(),
            latest,
            trend,
            history,
        })
    }

    /// Biggest movers over the last `period_days`.
    pub fn trending(&self, period_days: i64, limit: usize) -> Result<Trending, GekkoError> {
        let since = self.cutoff(period_days);
        let mut entries = Vec::new();

        for symbol in self.repo.priced_symbols()? {
            let series = self.repo.load_series_since(&symbol, since)?;
            if let Some(entry) = trend_entry(&symbol, &series) {
                entries.push(entry);
            }
        }

        let mut gainers = entries.clone();
        gainers.sort_by(|a, b| {
            b.change_pct
                .cmp(&a.change_pct)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        gainers.truncate(limit);

        let mut losers = entries;
        losers.sort_by(|a, b| {
            a.change_pct
                .cmp(&b.change_pct)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        losers.truncate(limit);

        Ok(Trending { gainers, losers })
    }

    /// Tracked symbols grouped by asset class.
    pub fn tracked_symbols(&self) -> Result<BTreeMap<AssetClass, Vec<String>>, GekkoError> {
        let mut grouped: BTreeMap<AssetClass, Vec<String>> = BTreeMap::new();
        for m in self.repo.all_metadata()? {
            grouped.entry(m.asset_class).or_default().push(m.symbol);
        }
        Ok(grouped)
    }
}

fn sort_newest_first(signals: &mut [SignalEvent]) {
    signals.sort_by(|a, b| {
        b.signal_date
            .cmp(&a.signal_date)
            .then_with(|| a.symbol.cmp(&b.symbol))
            .then_with(|| a.timeframe.cmp(&b.timeframe))
    });
}

fn trend_entry(symbol: &str, series: &[TimeseriesRecord]) -> Option<TrendEntry> {
    let (first, last) = match series {
        [first, .., last] => (first, last),
        _ => return None,
    };
    if first.close().is_zero() {
        return None;
    }

    let change = (last.close() - first.close()) / first.close() * Decimal::ONE_HUNDRED;
    Some(TrendEntry {
        symbol: symbol.to_string(),
        start_date: first.date(),
        end_date: last.date(),
        start_close: first.close(),
        end_close: last.close(),
        change_pct: change.round_dp(2),
    })
}

//! Price timeseries storage port.

use crate::domain::error::GekkoError;
use crate::domain::price::{PricePoint, TimeseriesRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Moving averages to write back onto one stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovingAverageUpdate {
    pub date: NaiveDate,
    pub ma_short: Option<Decimal>,
    pub ma_long: Option<Decimal>,
}

pub trait PricePort: Send + Sync {
    /// Upsert `points` by (symbol, date), then apply `averages`, as one
    /// atomic write: on error nothing is stored. Returns the number of price
    /// rows written.
    fn write_series(
        &self,
        symbol: &str,
        points: &[PricePoint],
        averages: &[MovingAverageUpdate],
    ) -> Result<usize, GekkoError>;

    /// The symbol's full history, oldest first.
    fn load_series(&self, symbol: &str) -> Result<Vec<TimeseriesRecord>, GekkoError>;

    /// History from `start` (inclusive), oldest first.
    fn load_series_since(
        &self,
        symbol: &str,
        start: NaiveDate,
    ) -> Result<Vec<TimeseriesRecord>, GekkoError>;

    fn get_record(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<TimeseriesRecord>, GekkoError>;

    /// The newest `limit` records, oldest first.
    fn latest_records(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<TimeseriesRecord>, GekkoError>;

    /// Symbols with at least one stored price, sorted.
    fn priced_symbols(&self) -> Result<Vec<String>, GekkoError>;
}

//! Price source port for ingestion.

use crate::domain::error::GekkoError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub trait PriceFeed {
    /// Already-fetched OHLCV rows for `symbol` within `[start, end]`.
    fn fetch_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, GekkoError>;
}

//! Price points and the per-symbol timeseries records derived from them.

use crate::domain::error::GekkoError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// One raw OHLCV observation as handed over by an ingestion source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: Decimal,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub volume: Option<i64>,
}

impl PricePoint {
    /// A close-only point; OHLC and volume left empty.
    pub fn close_only(symbol: &str, date: NaiveDate, close: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            date,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
        }
    }
}

/// A stored price point plus the moving averages computed over its history.
///
/// `ma_short` / `ma_long` stay `None` until the symbol has at least `window`
/// points up to and including `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeseriesRecord {
    #[serde(flatten)]
    pub price: PricePoint,
    pub ma_short: Option<Decimal>,
    pub ma_long: Option<Decimal>,
}

impl TimeseriesRecord {
    pub fn from_price(price: PricePoint) -> Self {
        Self {
            price,
            ma_short: None,
            ma_long: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.price.date
    }

    pub fn close(&self) -> Decimal {
        self.price.close
    }

    /// Both averages, or `None` if either is still warming up.
    pub fn moving_averages(&self) -> Option<(Decimal, Decimal)> {
        Some((self.ma_short?, self.ma_long?))
    }
}

/// Reject a batch before anything is written.
///
/// Every point must belong to `symbol`, carry a positive close, keep
/// `low <= high` when both are present and have a non-negative volume.
pub fn validate_points(symbol: &str, points: &[PricePoint]) -> Result<(), GekkoError> {
    if symbol.trim().is_empty() {
        return Err(GekkoError::validation(symbol, "symbol must not be empty"));
    }

    for p in points {
        if p.symbol != symbol {
            return Err(GekkoError::validation(
                symbol,
                format!("{}: point belongs to {}", p.date, p.symbol),
            ));
        }
        if p.close <= Decimal::ZERO {
            return Err(GekkoError::validation(
                symbol,
                format!("{}: close must be positive, got {}", p.date, p.close),
            ));
        }
        for (field, value) in [("open", p.open), ("high", p.high), ("low", p.low)] {
            if let Some(v) = value.filter(|v| *v <= Decimal::ZERO) {
                return Err(GekkoError::validation(
                    symbol,
                    format!("{}: {field} must be positive, got {v}", p.date),
                ));
            }
        }
        if let (Some(high), Some(low)) = (p.high, p.low) {
            if low > high {
                return Err(GekkoError::validation(
                    symbol,
                    format!("{}: low {low} above high {high}", p.date),
                ));
            }
        }
        if let Some(volume) = p.volume.filter(|v| *v < 0) {
            return Err(GekkoError::validation(
                symbol,
                format!("{}: negative volume {volume}", p.date),
            ));
        }
    }

    Ok(())
}

/// Collapse a batch to one point per date, the later row winning, in date order.
pub fn merge_points(points: Vec<PricePoint>) -> Vec<PricePoint> {
    let mut by_date: BTreeMap<NaiveDate, PricePoint> = BTreeMap::new();
    for p in points {
        by_date.insert(p.date, p);
    }
    by_date.into_values().collect()
}

/// The stored `series` with `points` upserted by date, oldest first.
///
/// Replaced rows lose their moving averages; the caller recomputes them.
pub fn merge_into_series(
    series: Vec<TimeseriesRecord>,
    points: &[PricePoint],
) -> Vec<TimeseriesRecord> {
    let mut by_date: BTreeMap<NaiveDate, TimeseriesRecord> =
        series.into_iter().map(|r| (r.date(), r)).collect();
    for p in points {
        by_date.insert(p.date, TimeseriesRecord::from_price(p.clone()));
    }
    by_date.into_values().collect()
}

/// Parse a required decimal price field.
pub fn parse_price(symbol: &str, field: &str, raw: &str) -> Result<Decimal, GekkoError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GekkoError::validation(symbol, format!("missing {field}")));
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| GekkoError::validation(symbol, format!("non-numeric {field}: {trimmed:?}")))
}

/// Parse an optional decimal price field; blank means absent.
pub fn parse_optional_price(
    symbol: &str,
    field: &str,
    raw: Option<&str>,
) -> Result<Option<Decimal>, GekkoError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_price(symbol, field, v).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn sample_point() -> PricePoint {
        PricePoint {
            symbol: "GC=F".into(),
            date: day(1),
            close: dec!(2050.40),
            open: Some(dec!(2040.00)),
            high: Some(dec!(2061.10)),
            low: Some(dec!(2035.25)),
            volume: Some(180_000),
        }
    }

    #[test]
    fn valid_point_passes() {
        assert!(validate_points("GC=F", &[sample_point()]).is_ok());
    }

    #[test]
    fn empty_batch_is_valid() {
        assert!(validate_points("GC=F", &[]).is_ok());
    }

    #[test]
    fn rejects_foreign_symbol() {
        let err = validate_points("SI=F", &[sample_point()]).unwrap_err();
        assert!(matches!(err, GekkoError::Validation { symbol, .. } if symbol == "SI=F"));
    }

    #[test]
    fn rejects_non_positive_close() {
        let mut p = sample_point();
        p.close = Decimal::ZERO;
        assert!(validate_points("GC=F", &[p]).is_err());
    }

    #[test]
    fn rejects_inverted_range() {
        let mut p = sample_point();
        p.low = Some(dec!(2100));
        let err = validate_points("GC=F", &[p]).unwrap_err();
        assert!(err.to_string().contains("above high"));
    }

    #[test]
    fn rejects_negative_volume() {
        let mut p = sample_point();
        p.volume = Some(-1);
        assert!(validate_points("GC=F", &[p]).is_err());
    }

    #[test]
    fn merge_keeps_last_row_per_date() {
        let a = PricePoint::close_only("X", day(2), dec!(10));
        let b = PricePoint::close_only("X", day(1), dec!(9));
        let c = PricePoint::close_only("X", day(2), dec!(11));

        let merged = merge_points(vec![a, b, c]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].date, day(1));
        assert_eq!(merged[1].close, dec!(11));
    }

    #[test]
    fn merge_into_series_replaces_and_inserts_in_order() {
        let stored = vec![
            TimeseriesRecord {
                price: PricePoint::close_only("X", day(1), dec!(9)),
                ma_short: Some(dec!(9)),
                ma_long: None,
            },
            TimeseriesRecord::from_price(PricePoint::close_only("X", day(3), dec!(12))),
        ];
        let incoming = [
            PricePoint::close_only("X", day(2), dec!(10)),
            PricePoint::close_only("X", day(1), dec!(8)),
        ];

        let series = merge_into_series(stored, &incoming);
        let closes: Vec<_> = series.iter().map(|r| r.close()).collect();
        assert_eq!(closes, vec![dec!(8), dec!(10), dec!(12)]);
        assert_eq!(series[0].ma_short, None);
    }

    #[test]
    fn parse_price_accepts_plain_and_scientific() {
        assert_eq!(parse_price("X", "close", " 101.25 ").unwrap(), dec!(101.25));
        assert_eq!(parse_price("X", "close", "1.5e2").unwrap(), dec!(150));
    }

    #[test]
    fn parse_price_rejects_garbage_and_blank() {
        assert!(parse_price("X", "close", "n/a").is_err());
        assert!(parse_price("X", "close", "  ").is_err());
    }

    #[test]
    fn parse_optional_price_blank_is_none() {
        assert_eq!(parse_optional_price("X", "open", Some("")).unwrap(), None);
        assert_eq!(parse_optional_price("X", "open", None).unwrap(), None);
        assert_eq!(
            parse_optional_price("X", "open", Some("3.5")).unwrap(),
            Some(dec!(3.5))
        );
    }

    #[test]
    fn moving_averages_need_both_values() {
        let mut rec = TimeseriesRecord::from_price(sample_point());
        assert_eq!(rec.moving_averages(), None);
        rec.ma_short = Some(dec!(1));
        assert_eq!(rec.moving_averages(), None);
        rec.ma_long = Some(dec!(2));
        assert_eq!(rec.moving_averages(), Some((dec!(1), dec!(2))));
    }
}

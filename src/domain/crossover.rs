//! Moving-average crossover classification.
//!
//! # Semantics
//!
//! - Bullish: `prev_short <= prev_long` and `curr_short > curr_long`
//! - Bearish: `prev_short >= prev_long` and `curr_short < curr_long`
//! - Equality counts as "not above": equal -> above is bullish, but
//!   above -> equal is not bearish and below -> equal is not bullish.
//! - No event unless both records carry both averages and sit exactly one
//!   timeframe period apart.

use crate::domain::price::TimeseriesRecord;
use crate::domain::signal::{SignalEvent, SignalType, Timeframe};
use rust_decimal::Decimal;

/// Classify the move between two (previous, current) MA pairs.
pub fn cross_direction(
    prev_short: Decimal,
    prev_long: Decimal,
    curr_short: Decimal,
    curr_long: Decimal,
) -> Option<SignalType> {
    if prev_short <= prev_long && curr_short > curr_long {
        Some(SignalType::BullishCross)
    } else if prev_short >= prev_long && curr_short < curr_long {
        Some(SignalType::BearishCross)
    } else {
        None
    }
}

/// Classify the transition between two adjacent records of one symbol.
pub fn classify(
    previous: &TimeseriesRecord,
    current: &TimeseriesRecord,
    timeframe: Timeframe,
) -> Option<SignalType> {
    if previous.price.symbol != current.price.symbol {
        return None;
    }
    if timeframe.previous_period(current.date()) != Some(previous.date()) {
        return None;
    }

    let (prev_short, prev_long) = previous.moving_averages()?;
    let (curr_short, curr_long) = current.moving_averages()?;
    cross_direction(prev_short, prev_long, curr_short, curr_long)
}

/// Build the signal a qualifying transition would record, stamped with the
/// current record's date and averages.
pub fn detect(
    previous: &TimeseriesRecord,
    current: &TimeseriesRecord,
    timeframe: Timeframe,
) -> Option<SignalEvent> {
    let signal_type = classify(previous, current, timeframe)?;
    let (ma_short, ma_long) = current.moving_averages()?;
    Some(SignalEvent {
        symbol: current.price.symbol.clone(),
        timeframe,
        signal_date: current.date(),
        signal_type,
        ma_short,
        ma_long,
    })
}

/// Every crossover across an ordered series, oldest first.
pub fn scan(records: &[TimeseriesRecord], timeframe: Timeframe) -> Vec<SignalEvent> {
    records
        .windows(2)
        .filter_map(|pair| detect(&pair[0], &pair[1], timeframe))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record(day: u32, short: Option<Decimal>, long: Option<Decimal>) -> TimeseriesRecord {
        TimeseriesRecord {
            price: PricePoint::close_only(
                "^GSPC",
                NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                dec!(5000),
            ),
            ma_short: short,
            ma_long: long,
        }
    }

    fn series(short: &[i64], long: &[i64]) -> Vec<TimeseriesRecord> {
        short
            .iter()
            .zip(long)
            .enumerate()
            .map(|(i, (&s, &l))| {
                record(i as u32 + 1, Some(Decimal::from(s)), Some(Decimal::from(l)))
            })
            .collect()
    }

    #[test]
    fn rising_short_crosses_above() {
        let records = series(&[5, 6, 7, 8], &[8, 7, 6, 5]);

        assert_eq!(classify(&records[0], &records[1], Timeframe::Daily), None);
        assert_eq!(
            classify(&records[1], &records[2], Timeframe::Daily),
            Some(SignalType::BullishCross)
        );
        assert_eq!(classify(&records[2], &records[3], Timeframe::Daily), None);
    }

    #[test]
    fn falling_short_crosses_below() {
        let records = series(&[8, 7, 6, 5], &[5, 6, 7, 8]);

        let events = scan(&records, Timeframe::Daily);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].signal_type, SignalType::BearishCross);
        assert_eq!(events[0].signal_date, records[2].date());
        assert_eq!(events[0].ma_short, dec!(6));
        assert_eq!(events[0].ma_long, dec!(7));
    }

    #[test]
    fn flat_series_has_no_events() {
        let records = series(&[5, 5, 5, 5], &[5, 5, 5, 5]);
        assert!(scan(&records, Timeframe::Daily).is_empty());

        let records = series(&[9, 9, 9], &[4, 4, 4]);
        assert!(scan(&records, Timeframe::Daily).is_empty());
    }

    #[test]
    fn equality_to_above_is_bullish() {
        assert_eq!(
            cross_direction(dec!(10), dec!(10), dec!(11), dec!(10)),
            Some(SignalType::BullishCross)
        );
    }

    #[test]
    fn above_to_equality_is_not_bearish() {
        assert_eq!(cross_direction(dec!(11), dec!(10), dec!(10), dec!(10)), None);
    }

    #[test]
    fn below_to_equality_is_not_bullish() {
        assert_eq!(cross_direction(dec!(9), dec!(10), dec!(10), dec!(10)), None);
    }

    #[test]
    fn equality_to_below_is_bearish() {
        assert_eq!(
            cross_direction(dec!(10), dec!(10), dec!(9), dec!(10)),
            Some(SignalType::BearishCross)
        );
    }

    #[test]
    fn missing_average_gives_no_event() {
        let prev = record(1, Some(dec!(5)), None);
        let curr = record(2, Some(dec!(7)), Some(dec!(6)));
        assert_eq!(classify(&prev, &curr, Timeframe::Daily), None);

        let prev = record(1, Some(dec!(5)), Some(dec!(6)));
        let curr = record(2, None, Some(dec!(6)));
        assert_eq!(classify(&prev, &curr, Timeframe::Daily), None);
    }

    #[test]
    fn non_adjacent_dates_give_no_event() {
        let prev = record(1, Some(dec!(5)), Some(dec!(6)));
        let curr = record(3, Some(dec!(7)), Some(dec!(6)));
        assert_eq!(classify(&prev, &curr, Timeframe::Daily), None);

        let curr = record(8, Some(dec!(7)), Some(dec!(6)));
        assert_eq!(
            classify(&prev, &curr, Timeframe::Weekly),
            Some(SignalType::BullishCross)
        );
        assert_eq!(classify(&prev, &curr, Timeframe::Daily), None);
    }

    #[test]
    fn different_symbols_give_no_event() {
        let prev = record(1, Some(dec!(5)), Some(dec!(6)));
        let mut curr = record(2, Some(dec!(7)), Some(dec!(6)));
        curr.price.symbol = "^FTSE".into();
        assert_eq!(classify(&prev, &curr, Timeframe::Daily), None);
    }

    #[test]
    fn detect_stamps_current_values() {
        let prev = record(1, Some(dec!(5)), Some(dec!(6)));
        let curr = record(2, Some(dec!(6.5)), Some(dec!(6.1)));

        let event = detect(&prev, &curr, Timeframe::Daily).unwrap();
        assert_eq!(event.symbol, "^GSPC");
        assert_eq!(event.timeframe, Timeframe::Daily);
        assert_eq!(event.signal_date, curr.date());
        assert_eq!(event.ma_short, dec!(6.5));
        assert_eq!(event.ma_long, dec!(6.1));
    }
}

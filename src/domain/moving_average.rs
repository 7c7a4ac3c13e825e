//! Simple moving average over closing prices.
//!
//! SMA(n)[i] = sum(C[i-n+1..=i]) / n, summed and divided in exact decimal.
//! Warmup: the first (n-1) positions are `None`.

use crate::domain::error::GekkoError;
use crate::domain::price::TimeseriesRecord;
use crate::domain::settings::MaWindows;
use rust_decimal::Decimal;

/// Rolling mean of `prices` (oldest first) over `window` points.
///
/// The output has one entry per input price. A zero window yields all `None`.
/// Returns `None` if a window sum leaves the decimal range.
pub fn moving_average(prices: &[Decimal], window: usize) -> Option<Vec<Option<Decimal>>> {
    let mut values = Vec::with_capacity(prices.len());
    if window == 0 {
        values.resize(prices.len(), None);
        return Some(values);
    }

    let divisor = Decimal::from(window as u64);
    for i in 0..prices.len() {
        if i + 1 < window {
            values.push(None);
            continue;
        }
        let sum = prices[i + 1 - window..=i]
            .iter()
            .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p))?;
        values.push(Some(sum.checked_div(divisor)?));
    }

    Some(values)
}

/// Recompute `ma_short` / `ma_long` over a symbol's full ordered history.
///
/// Every record is overwritten, so the result depends only on the closes.
/// Fails with `Validation` when the closes are too large to average; the
/// records are left untouched in that case.
pub fn recompute_moving_averages(
    records: &mut [TimeseriesRecord],
    windows: MaWindows,
) -> Result<(), GekkoError> {
    let closes: Vec<Decimal> = records.iter().map(|r| r.close()).collect();
    let averages = moving_average(&closes, windows.short)
        .zip(moving_average(&closes, windows.long));
    let Some((short, long)) = averages else {
        let symbol = records.first().map_or("", |r| r.price.symbol.as_str());
        return Err(GekkoError::validation(
            symbol,
            "closes overflow the moving-average sum",
        ));
    };

    for ((record, s), l) in records.iter_mut().zip(short).zip(long) {
        record.ma_short = s;
        record.ma_long = l;
    }
    Ok(())
}

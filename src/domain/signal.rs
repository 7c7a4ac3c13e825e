//! Crossover signal records and the enums keying them.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sampling granularity of a price series and the signals derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::Weekly => "weekly",
            Timeframe::Monthly => "monthly",
        }
    }

    /// The date exactly one period before `date`.
    ///
    /// Monthly steps back one calendar month, clamping to the month's last day
    /// (Mar 31 -> Feb 29 in a leap year).
    pub fn previous_period(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Timeframe::Daily => date.pred_opt(),
            Timeframe::Weekly => date.checked_sub_days(Days::new(7)),
            Timeframe::Monthly => date.checked_sub_months(Months::new(1)),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "1d" => Ok(Timeframe::Daily),
            "weekly" | "1w" => Ok(Timeframe::Weekly),
            "monthly" | "1m" => Ok(Timeframe::Monthly),
            other => Err(format!("unknown timeframe: {other}")),
        }
    }
}

/// Direction of a moving-average crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    BullishCross,
    BearishCross,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::BullishCross => "bullish_cross",
            SignalType::BearishCross => "bearish_cross",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bullish_cross" | "bullish" => Ok(SignalType::BullishCross),
            "bearish_cross" | "bearish" => Ok(SignalType::BearishCross),
            other => Err(format!("unknown signal type: {other}")),
        }
    }
}

/// A detected crossover. Unique per (symbol, timeframe, signal_date) and never
/// modified once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub signal_date: NaiveDate,
    pub signal_type: SignalType,
    pub ma_short: Decimal,
    pub ma_long: Decimal,
}

impl SignalEvent {
    pub fn key(&self) -> SignalKey {
        SignalKey {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            signal_date: self.signal_date,
        }
    }
}

/// Uniqueness key of a [`SignalEvent`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalKey {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub signal_date: NaiveDate,
}

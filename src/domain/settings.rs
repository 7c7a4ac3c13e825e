//! Typed engine settings built from the `[signals]` config section.

use crate::domain::config_validation::{parse_positive, validate_signal_config};
use crate::domain::error::GekkoError;
use crate::domain::signal::Timeframe;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_MA_SHORT: usize = 8;
pub const DEFAULT_MA_LONG: usize = 20;
pub const DEFAULT_RECENT_DAYS: i64 = 7;

/// Short and long moving-average window lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaWindows {
    pub short: usize,
    pub long: usize,
}

impl Default for MaWindows {
    fn default() -> Self {
        Self {
            short: DEFAULT_MA_SHORT,
            long: DEFAULT_MA_LONG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSettings {
    pub windows: MaWindows,
    pub timeframe: Timeframe,
    pub recent_days: i64,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            windows: MaWindows::default(),
            timeframe: Timeframe::Daily,
            recent_days: DEFAULT_RECENT_DAYS,
        }
    }
}

impl SignalSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, GekkoError> {
        validate_signal_config(config)?;

        let defaults = Self::default();
        let timeframe = match config.get_string("signals", "timeframe") {
            Some(raw) => raw.parse().map_err(|reason| GekkoError::ConfigInvalid {
                section: "signals".into(),
                key: "timeframe".into(),
                reason,
            })?,
            None => defaults.timeframe,
        };

        Ok(Self {
            windows: MaWindows {
                short: parse_positive(config, "signals", "ma_short")?
                    .unwrap_or(defaults.windows.short),
                long: parse_positive(config, "signals", "ma_long")?
                    .unwrap_or(defaults.windows.long),
            },
            timeframe,
            recent_days: parse_positive(config, "signals", "recent_days")?
                .map(|d| i64::try_from(d).unwrap_or(i64::MAX))
                .unwrap_or(defaults.recent_days),
        })
    }
}

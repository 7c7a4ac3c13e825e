//! Configuration validation.
//!
//! Validates all config fields before any store is opened.

use crate::domain::error::GekkoError;
use crate::domain::settings::{DEFAULT_MA_LONG, DEFAULT_MA_SHORT};
use crate::domain::signal::Timeframe;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), GekkoError> {
    validate_sqlite(config)?;
    validate_signal_config(config)?;
    Ok(())
}

pub fn validate_signal_config(config: &dyn ConfigPort) -> Result<(), GekkoError> {
    let short = parse_positive(config, "signals", "ma_short")?.unwrap_or(DEFAULT_MA_SHORT);
    let long = parse_positive(config, "signals", "ma_long")?.unwrap_or(DEFAULT_MA_LONG);
    if short >= long {
        return Err(GekkoError::ConfigInvalid {
            section: "signals".to_string(),
            key: "ma_short".to_string(),
            reason: format!("ma_short ({short}) must be less than ma_long ({long})"),
        });
    }
    validate_timeframe(config)?;
    parse_positive(config, "signals", "recent_days")?;
    Ok(())
}

fn validate_sqlite(config: &dyn ConfigPort) -> Result<(), GekkoError> {
    match config.get_string("sqlite", "path") {
        Some(path) if !path.trim().is_empty() => {}
        _ => {
            return Err(GekkoError::ConfigMissing {
                section: "sqlite".to_string(),
                key: "path".to_string(),
            });
        }
    }
    parse_positive(config, "sqlite", "pool_size")?;
    Ok(())
}

fn validate_timeframe(config: &dyn ConfigPort) -> Result<(), GekkoError> {
    if let Some(raw) = config.get_string("signals", "timeframe") {
        raw.parse::<Timeframe>()
            .map_err(|reason| GekkoError::ConfigInvalid {
                section: "signals".to_string(),
                key: "timeframe".to_string(),
                reason,
            })?;
    }
    Ok(())
}

/// `Ok(None)` when the key is absent; an error unless it is an integer >= 1.
pub(crate) fn parse_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<usize>, GekkoError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    match raw.trim().parse::<usize>() {
        Ok(v) if v >= 1 => Ok(Some(v)),
        _ => Err(GekkoError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be a positive integer, got {raw:?}"),
        }),
    }
}

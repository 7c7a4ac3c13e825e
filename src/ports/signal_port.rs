//! Signal storage port.

use crate::domain::error::GekkoError;
use crate::domain::signal::{SignalEvent, SignalType, Timeframe};
use chrono::NaiveDate;

/// Outcome of recording a signal under the (symbol, timeframe, date) key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Created(SignalEvent),
    /// The key was already taken; carries the stored row, untouched.
    Existing(SignalEvent),
}

impl Recorded {
    pub fn into_event(self) -> SignalEvent {
        match self {
            Recorded::Created(e) | Recorded::Existing(e) => e,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Recorded::Created(_))
    }
}

/// Optional narrowing applied by [`SignalPort::signals_since`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalFilter {
    pub symbol: Option<String>,
    pub signal_type: Option<SignalType>,
}

pub trait SignalPort: Send + Sync {
    fn find_signal(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        signal_date: NaiveDate,
    ) -> Result<Option<SignalEvent>, GekkoError>;

    /// Store `event` unless its key exists; never overwrites.
    fn record_signal(&self, event: &SignalEvent) -> Result<Recorded, GekkoError>;

    /// Signals dated on or after `since`, in no particular order.
    fn signals_since(
        &self,
        since: NaiveDate,
        filter: &SignalFilter,
    ) -> Result<Vec<SignalEvent>, GekkoError>;
}

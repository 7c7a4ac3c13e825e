//! Port traits between the signal engine and its collaborators.

pub mod config_port;
pub mod feed_port;
pub mod metadata_port;
pub mod price_port;
pub mod signal_port;

use metadata_port::MetadataPort;
use price_port::PricePort;
use signal_port::SignalPort;

/// Everything the engine and query service read from or write to.
///
/// Implemented automatically for any type providing all three stores.
pub trait Repository: PricePort + SignalPort + MetadataPort {}

impl<T: PricePort + SignalPort + MetadataPort> Repository for T {}

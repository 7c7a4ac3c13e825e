//! gekko-signals: moving-average crossover signals over daily price series.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
#[cfg(feature = "sqlite")]
pub mod cli;
pub mod domain;
pub mod ports;

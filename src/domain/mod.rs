//! Core domain types and logic.

pub mod asset;
pub mod config_validation;
pub mod crossover;
pub mod engine;
pub mod error;
pub mod moving_average;
pub mod price;
pub mod query;
pub mod settings;
pub mod signal;

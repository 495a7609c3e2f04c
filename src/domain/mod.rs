//! Core domain types and logic.

pub mod ohlcv;
pub mod signal;
pub mod indicator;
pub mod strategy;
pub mod portfolio;
pub mod execution;
pub mod metrics;
pub mod backtest;
pub mod comparison;
pub mod universe;
pub mod data_quality;
pub mod config_validation;
pub mod error;

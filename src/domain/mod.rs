//! Core domain types and logic.

pub mod ohlcv;
pub mod granularity;
pub mod indicator;
pub mod params;
pub mod signal;
pub mod strategy;
pub mod performance;
pub mod optimizer;
pub mod backtest;
pub mod backtester;
pub mod config_validation;
pub mod error;

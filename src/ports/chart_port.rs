//! Performance chart rendering port.

use chrono::NaiveDateTime;

use crate::domain::error::BacktestError;

/// The two cumulative curves of one backtest, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceChart {
    pub title: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub buy_and_hold: Vec<f64>,
    pub strategy: Vec<f64>,
}

pub trait ChartPort {
    fn render(&self, chart: &PerformanceChart) -> Result<(), BacktestError>;
}

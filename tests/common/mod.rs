#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::cell::Cell;
use vectrader::domain::backtest::BacktestConfig;
use vectrader::domain::error::BacktestError;
use vectrader::domain::granularity::Granularity;
pub use vectrader::domain::ohlcv::{OhlcvBar, PriceSeries};
use vectrader::ports::data_port::DataPort;

pub const SYMBOL: &str = "EUR_USD";

/// Data port serving one canned series, or failing with a canned reason.
pub struct MockDataPort {
    pub closes: Vec<f64>,
    pub error: Option<String>,
    pub fetches: Cell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            closes: Vec::new(),
            error: None,
            fetches: Cell::new(0),
        }
    }

    pub fn with_prices(mut self, closes: Vec<f64>) -> Self {
        self.closes = closes;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
        granularity: Granularity,
    ) -> Result<PriceSeries, BacktestError> {
        self.fetches.set(self.fetches.get() + 1);
        if let Some(reason) = &self.error {
            return Err(BacktestError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        PriceSeries::new(symbol, granularity, make_bars(&self.closes))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn timestamp(day: usize) -> NaiveDateTime {
    (date(2024, 1, 1) + chrono::Duration::days(day as i64))
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            timestamp: timestamp(i),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1000,
        })
        .collect()
}

pub fn make_series(closes: &[f64]) -> PriceSeries {
    PriceSeries::new(SYMBOL, Granularity::Daily, make_bars(closes)).unwrap()
}

/// `n` closes rising in a straight line from `from` to `to`.
pub fn linear(from: f64, to: f64, n: usize) -> Vec<f64> {
    let step = (to - from) / (n - 1) as f64;
    (0..n).map(|i| from + step * i as f64).collect()
}

pub fn flat(price: f64, n: usize) -> Vec<f64> {
    vec![price; n]
}

/// A deterministic oscillating series with drift, rich in crossovers.
pub fn wave(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + 0.05 * t + 8.0 * (t / 9.0).sin() + 3.0 * (t / 2.3).cos()
        })
        .collect()
}

pub fn sample_config(strategy: &str) -> BacktestConfig {
    BacktestConfig::new(
        SYMBOL,
        strategy,
        date(2024, 1, 1),
        date(2024, 12, 31),
        Granularity::Daily,
    )
}

/// A complete option set covering every strategy family.
pub fn all_options(config: BacktestConfig) -> BacktestConfig {
    config
        .with_option("SMA", 10.0)
        .with_option("DEV", 2.0)
        .with_option("SMA_S", 5.0)
        .with_option("SMA_L", 15.0)
        .with_option("EMA_S", 5.0)
        .with_option("EMA_L", 15.0)
        .with_option("SIGNAL_MW", 4.0)
        .with_option("PERIODS", 10.0)
        .with_option("RSI_LOW", 30.0)
        .with_option("RSI_HIGH", 70.0)
        .with_option("D_MW", 3.0)
}

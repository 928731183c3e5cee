//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values
//!
//! Every series is aligned 1:1 with the bars it was computed from. Points
//! inside the warmup window carry `None`, never a placeholder zero.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;

pub use bollinger::calculate_bollinger;
pub use ema::ema_values;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::rolling_mean;
pub use stochastic::calculate_stochastic;

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<IndicatorValue>,
}

impl IndicatorPoint {
    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    /// Two lines compared by a crossover rule (price vs average, short vs long).
    Crossover {
        fast: f64,
        slow: f64,
    },
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorType {
    Rsi(usize),
    PriceVsSma(usize),
    SmaCross {
        short: usize,
        long: usize,
    },
    EmaCross {
        short: usize,
        long: usize,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Zip per-bar optional values back onto the bar timestamps.
    pub(crate) fn from_values(
        indicator_type: IndicatorType,
        bars: &[OhlcvBar],
        values: impl IntoIterator<Item = Option<IndicatorValue>>,
    ) -> Self {
        let values = bars
            .iter()
            .zip(values)
            .map(|(bar, value)| IndicatorPoint {
                timestamp: bar.timestamp,
                value,
            })
            .collect();
        Self {
            indicator_type,
            values,
        }
    }
}

/// Pairs two aligned lines into a crossover series; a point is defined only
/// where both lines are.
pub fn crossover_series(
    indicator_type: IndicatorType,
    bars: &[OhlcvBar],
    fast: &[Option<f64>],
    slow: &[Option<f64>],
) -> IndicatorSeries {
    let values = fast.iter().zip(slow).map(|(f, s)| match (f, s) {
        (Some(fast), Some(slow)) => Some(IndicatorValue::Crossover {
            fast: *fast,
            slow: *slow,
        }),
        _ => None,
    });
    IndicatorSeries::from_values(indicator_type, bars, values)
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::PriceVsSma(period) => write!(f, "CLOSE/SMA({})", period),
            IndicatorType::SmaCross { short, long } => write!(f, "SMA({})/SMA({})", short, long),
            IndicatorType::EmaCross { short, long } => write!(f, "EMA({})/EMA({})", short, long),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult,
            } => write!(f, "BOLLINGER({},{})", period, stddev_mult),
        }
    }
}

//! Discrete position signals derived from indicator series.
//!
//! Every generator is causal: the position at bar `t` reads indicator points
//! and closes at bars `<= t` only. An undefined indicator point always maps
//! to `Flat`.

use std::cmp::Ordering;
use std::fmt;

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Position {
    Short = -1,
    #[default]
    Flat = 0,
    Long = 1,
}

impl Position {
    pub fn value(self) -> i8 {
        self as i8
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.value())
    }

    /// Long when `fast` is above `slow`, short when below, flat on a tie.
    pub fn from_crossover(fast: f64, slow: f64) -> Self {
        match fast.partial_cmp(&slow) {
            Some(Ordering::Greater) => Position::Long,
            Some(Ordering::Less) => Position::Short,
            _ => Position::Flat,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Short => write!(f, "short"),
            Position::Flat => write!(f, "flat"),
            Position::Long => write!(f, "long"),
        }
    }
}

pub type PositionSeries = Vec<Position>;

/// Crossover rule for any two-line indicator: price vs average, short vs
/// long average, MACD line vs signal, %K vs %D.
pub fn crossover_positions(indicators: &IndicatorSeries) -> PositionSeries {
    indicators
        .values
        .iter()
        .map(|point| match point.value {
            Some(IndicatorValue::Crossover { fast, slow }) => Position::from_crossover(fast, slow),
            Some(IndicatorValue::Macd { line, signal, .. }) => {
                Position::from_crossover(line, signal)
            }
            Some(IndicatorValue::Stochastic { k, d }) => Position::from_crossover(k, d),
            _ => Position::Flat,
        })
        .collect()
}

/// Mean-reversion thresholds on a single oscillator value: above `high`
/// goes short, below `low` goes long, anything in between is flat.
pub fn threshold_positions(indicators: &IndicatorSeries, low: f64, high: f64) -> PositionSeries {
    indicators
        .values
        .iter()
        .map(|point| match point.value {
            Some(IndicatorValue::Simple(v)) if v > high => Position::Short,
            Some(IndicatorValue::Simple(v)) if v < low => Position::Long,
            _ => Position::Flat,
        })
        .collect()
}

/// Bollinger mean reversion.
///
/// A close above the upper band goes short and below the lower band goes
/// long. Otherwise a close that crosses the middle band (the sign of
/// `close - middle` flips) goes flat, and any other bar holds the previous
/// position. Band breaches take precedence over the middle crossing.
pub fn bollinger_positions(bars: &[OhlcvBar], indicators: &IndicatorSeries) -> PositionSeries {
    let mut positions = Vec::with_capacity(bars.len());
    let mut held = Position::Flat;
    let mut prev_distance: Option<f64> = None;

    for (bar, point) in bars.iter().zip(&indicators.values) {
        let IndicatorPoint {
            value: Some(IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            }),
            ..
        } = *point
        else {
            held = Position::Flat;
            prev_distance = None;
            positions.push(Position::Flat);
            continue;
        };

        let distance = bar.close - middle;
        held = if bar.close > upper {
            Position::Short
        } else if bar.close < lower {
            Position::Long
        } else if prev_distance.is_some_and(|prev| prev * distance < 0.0) {
            Position::Flat
        } else {
            held
        };
        prev_distance = Some(distance);
        positions.push(held);
    }

    positions
}

/// Number of bars at which the position differs from the one before it,
/// starting from flat.
pub fn count_trades(positions: &[Position]) -> usize {
    let mut prev = Position::Flat;
    positions
        .iter()
        .filter(|&&p| {
            let changed = p != prev;
            prev = p;
            changed
        })
        .count()
}

//! Stochastic Oscillator indicator.
//!
//! %K = (C - lowest low) / (highest high - lowest low) * 100 over k_period bars
//! %D = SMA(d_period) of %K
//!
//! A window whose high-low range is zero has no defined %K, and any %D
//! window touching it is undefined as well.
//! Warmup: (k_period - 1) + (d_period - 1) bars.

use crate::domain::indicator::{rolling_mean, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_stochastic(bars: &[OhlcvBar], k_period: usize, d_period: usize) -> IndicatorSeries {
    let k_line = percent_k(bars, k_period);
    let d_line = rolling_mean(&k_line, d_period);

    let values = k_line.iter().zip(&d_line).map(|(k, d)| match (k, d) {
        (Some(k), Some(d)) => Some(IndicatorValue::Stochastic { k: *k, d: *d }),
        _ => None,
    });

    IndicatorSeries::from_values(
        IndicatorType::Stochastic { k_period, d_period },
        bars,
        values,
    )
}

fn percent_k(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 {
        return out;
    }

    for i in (period - 1)..bars.len() {
        let window = &bars[i + 1 - period..=i];
        let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let range = highest - lowest;
        if range > 0.0 {
            out[i] = Some((bars[i].close - lowest) / range * 100.0);
        }
    }
    out
}

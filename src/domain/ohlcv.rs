//! OHLCV bars and the immutable price series built from them.

use chrono::NaiveDateTime;

use crate::domain::error::BacktestError;
use crate::domain::granularity::Granularity;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Time-ordered bars for one symbol at one granularity.
///
/// Timestamps are strictly increasing and every close is finite and
/// positive, so log returns are always defined. There is no way to mutate a
/// series after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    granularity: Granularity,
    bars: Vec<OhlcvBar>,
}

impl PriceSeries {
    pub fn new(
        symbol: impl Into<String>,
        granularity: Granularity,
        bars: Vec<OhlcvBar>,
    ) -> Result<Self, BacktestError> {
        let symbol = symbol.into();

        for (i, bar) in bars.iter().enumerate() {
            if !bar.close.is_finite() || bar.close <= 0.0 {
                return Err(BacktestError::InvalidSeries {
                    symbol,
                    reason: format!("bar {} at {} has close {}", i, bar.timestamp, bar.close),
                });
            }
        }

        if let Some(pair) = bars.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(BacktestError::InvalidSeries {
                symbol,
                reason: format!(
                    "timestamps not strictly increasing: {} followed by {}",
                    pair[0].timestamp, pair[1].timestamp
                ),
            });
        }

        Ok(Self {
            symbol,
            granularity,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    /// ln(C[i] / C[i-1]), with 0.0 for the first bar.
    pub fn log_returns(&self) -> Vec<f64> {
        let mut returns = Vec::with_capacity(self.bars.len());
        if !self.bars.is_empty() {
            returns.push(0.0);
        }
        returns.extend(self.bars.windows(2).map(|w| (w[1].close / w[0].close).ln()));
        returns
    }

    /// Fails unless the series holds at least `minimum` bars.
    pub fn require_bars(&self, minimum: usize) -> Result<(), BacktestError> {
        if self.bars.len() < minimum {
            return Err(BacktestError::InsufficientData {
                symbol: self.symbol.clone(),
                bars: self.bars.len(),
                minimum,
            });
        }
        Ok(())
    }
}

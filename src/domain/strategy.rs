//! Strategy families and their validated parameterizations.
//!
//! [`StrategyKind`] names a family and knows which parameters it needs.
//! [`StrategyKind::rule`] turns a [`ParameterSet`] into a typed
//! [`StrategyRule`], which computes its indicators and positions.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::BacktestError;
use crate::domain::indicator::{
    calculate_bollinger, calculate_macd, calculate_rsi, calculate_stochastic, crossover_series,
    ema_values, rolling_mean, IndicatorSeries, IndicatorType,
};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::params::{self, ParameterSet};
use crate::domain::signal::{
    bollinger_positions, crossover_positions, threshold_positions, Position, PositionSeries,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Bollinger,
    Ema,
    Macd,
    Rsi,
    Sma,
    SmaCross,
    Stochastic,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::Bollinger,
        StrategyKind::Ema,
        StrategyKind::Macd,
        StrategyKind::Rsi,
        StrategyKind::Sma,
        StrategyKind::SmaCross,
        StrategyKind::Stochastic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Bollinger => "BB",
            StrategyKind::Ema => "EMA",
            StrategyKind::Macd => "MACD",
            StrategyKind::Rsi => "RSI",
            StrategyKind::Sma => "SMA",
            StrategyKind::SmaCross => "SMA_CROSS",
            StrategyKind::Stochastic => "SO",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StrategyKind::Bollinger => "Bollinger Bands mean reversion",
            StrategyKind::Ema => "short/long exponential moving average crossover",
            StrategyKind::Macd => "MACD line vs signal line crossover",
            StrategyKind::Rsi => "RSI overbought/oversold thresholds",
            StrategyKind::Sma => "close vs simple moving average",
            StrategyKind::SmaCross => "short/long simple moving average crossover",
            StrategyKind::Stochastic => "stochastic oscillator %K vs %D",
        }
    }

    /// Parameter names this family needs, in lexicographic order.
    pub fn required_params(self) -> &'static [&'static str] {
        match self {
            StrategyKind::Bollinger => &[params::DEV, params::SMA],
            StrategyKind::Ema => &[params::EMA_L, params::EMA_S],
            StrategyKind::Macd => &[params::EMA_L, params::EMA_S, params::SIGNAL_MW],
            StrategyKind::Rsi => &[params::PERIODS, params::RSI_HIGH, params::RSI_LOW],
            StrategyKind::Sma => &[params::SMA],
            StrategyKind::SmaCross => &[params::SMA_L, params::SMA_S],
            StrategyKind::Stochastic => &[params::D_MW, params::PERIODS],
        }
    }

    /// Validate `parameters` against this family and build its rule.
    ///
    /// Every required key must be present and no other key may appear.
    pub fn rule(self, parameters: &ParameterSet) -> Result<StrategyRule, BacktestError> {
        let required: &[&str] = self.required_params();
        if let Some(key) = parameters.keys().find(|k| !required.contains(k)) {
            return Err(BacktestError::UnknownParameter {
                strategy: self.name().to_string(),
                key: key.to_string(),
            });
        }

        let value = |key: &str| {
            parameters.get(key).ok_or_else(|| BacktestError::MissingParameter {
                strategy: self.name().to_string(),
                key: key.to_string(),
            })
        };
        let window = |key: &str| value(key).and_then(|v| as_window(key, v));

        let rule = match self {
            StrategyKind::Bollinger => StrategyRule::Bollinger {
                window: window(params::SMA)?,
                deviations: as_deviation(params::DEV, value(params::DEV)?)?,
            },
            StrategyKind::Ema => StrategyRule::Ema {
                short: window(params::EMA_S)?,
                long: window(params::EMA_L)?,
            },
            StrategyKind::Macd => StrategyRule::Macd {
                short: window(params::EMA_S)?,
                long: window(params::EMA_L)?,
                signal: window(params::SIGNAL_MW)?,
            },
            StrategyKind::Rsi => {
                let periods = window(params::PERIODS)?;
                let low = as_threshold(params::RSI_LOW, value(params::RSI_LOW)?)?;
                let high = as_threshold(params::RSI_HIGH, value(params::RSI_HIGH)?)?;
                if low > high {
                    return Err(BacktestError::InvalidParameter {
                        key: params::RSI_LOW.to_string(),
                        reason: format!("{} is above RSI_HIGH {}", low, high),
                    });
                }
                StrategyRule::Rsi { periods, low, high }
            }
            StrategyKind::Sma => StrategyRule::Sma {
                window: window(params::SMA)?,
            },
            StrategyKind::SmaCross => StrategyRule::SmaCross {
                short: window(params::SMA_S)?,
                long: window(params::SMA_L)?,
            },
            StrategyKind::Stochastic => StrategyRule::Stochastic {
                periods: window(params::PERIODS)?,
                d_window: window(params::D_MW)?,
            },
        };
        Ok(rule)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.name() == upper)
            .ok_or_else(|| BacktestError::UnknownStrategy {
                name: s.to_string(),
            })
    }
}

fn as_window(key: &str, value: f64) -> Result<usize, BacktestError> {
    if !value.is_finite() || value < 1.0 || value.fract() != 0.0 {
        return Err(BacktestError::InvalidParameter {
            key: key.to_string(),
            reason: format!("window must be a positive integer, got {}", value),
        });
    }
    Ok(value as usize)
}

fn as_deviation(key: &str, value: f64) -> Result<f64, BacktestError> {
    if !value.is_finite() || value < 0.0 {
        return Err(BacktestError::InvalidParameter {
            key: key.to_string(),
            reason: format!("deviation multiplier must be finite and non-negative, got {}", value),
        });
    }
    Ok(value)
}

fn as_threshold(key: &str, value: f64) -> Result<f64, BacktestError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(BacktestError::InvalidParameter {
            key: key.to_string(),
            reason: format!("threshold must lie in [0, 100], got {}", value),
        });
    }
    Ok(value)
}

/// A strategy family with validated, typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyRule {
    Bollinger { window: usize, deviations: f64 },
    Ema { short: usize, long: usize },
    Macd { short: usize, long: usize, signal: usize },
    Rsi { periods: usize, low: f64, high: f64 },
    Sma { window: usize },
    SmaCross { short: usize, long: usize },
    Stochastic { periods: usize, d_window: usize },
}

impl StrategyRule {
    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyRule::Bollinger { .. } => StrategyKind::Bollinger,
            StrategyRule::Ema { .. } => StrategyKind::Ema,
            StrategyRule::Macd { .. } => StrategyKind::Macd,
            StrategyRule::Rsi { .. } => StrategyKind::Rsi,
            StrategyRule::Sma { .. } => StrategyKind::Sma,
            StrategyRule::SmaCross { .. } => StrategyKind::SmaCross,
            StrategyRule::Stochastic { .. } => StrategyKind::Stochastic,
        }
    }

    pub fn windows(&self) -> Vec<usize> {
        match *self {
            StrategyRule::Bollinger { window, .. } | StrategyRule::Sma { window } => vec![window],
            StrategyRule::Ema { short, long } | StrategyRule::SmaCross { short, long } => {
                vec![short, long]
            }
            StrategyRule::Macd {
                short,
                long,
                signal,
            } => vec![short, long, signal],
            StrategyRule::Rsi { periods, .. } => vec![periods],
            StrategyRule::Stochastic { periods, d_window } => vec![periods, d_window],
        }
    }

    pub fn indicator_type(&self) -> IndicatorType {
        match *self {
            StrategyRule::Bollinger { window, deviations } => IndicatorType::Bollinger {
                period: window,
                stddev_mult: deviations,
            },
            StrategyRule::Ema { short, long } => IndicatorType::EmaCross { short, long },
            StrategyRule::Macd {
                short,
                long,
                signal,
            } => IndicatorType::Macd {
                fast: short,
                slow: long,
                signal,
            },
            StrategyRule::Rsi { periods, .. } => IndicatorType::Rsi(periods),
            StrategyRule::Sma { window } => IndicatorType::PriceVsSma(window),
            StrategyRule::SmaCross { short, long } => IndicatorType::SmaCross { short, long },
            StrategyRule::Stochastic { periods, d_window } => IndicatorType::Stochastic {
                k_period: periods,
                d_period: d_window,
            },
        }
    }

    /// Indicator output aligned with `series`. A window as long as the
    /// series or longer leaves every point undefined.
    pub fn compute(&self, series: &PriceSeries) -> IndicatorSeries {
        let bars = series.bars();
        if self.windows().iter().any(|&w| w >= bars.len()) {
            return IndicatorSeries::from_values(
                self.indicator_type(),
                bars,
                std::iter::repeat(None),
            );
        }

        let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
        match *self {
            StrategyRule::Bollinger { window, deviations } => {
                calculate_bollinger(bars, window, deviations)
            }
            StrategyRule::Ema { short, long } => crossover_series(
                self.indicator_type(),
                bars,
                &ema_values(&closes, short),
                &ema_values(&closes, long),
            ),
            StrategyRule::Macd {
                short,
                long,
                signal,
            } => calculate_macd(bars, short, long, signal),
            StrategyRule::Rsi { periods, .. } => calculate_rsi(bars, periods),
            StrategyRule::Sma { window } => crossover_series(
                self.indicator_type(),
                bars,
                &closes,
                &rolling_mean(&closes, window),
            ),
            StrategyRule::SmaCross { short, long } => crossover_series(
                self.indicator_type(),
                bars,
                &rolling_mean(&closes, short),
                &rolling_mean(&closes, long),
            ),
            StrategyRule::Stochastic { periods, d_window } => {
                calculate_stochastic(bars, periods, d_window)
            }
        }
    }

    /// Positions from an indicator series previously produced by
    /// [`StrategyRule::compute`] on the same `series`.
    pub fn generate(&self, series: &PriceSeries, indicators: &IndicatorSeries) -> PositionSeries {
        let mut positions = match *self {
            StrategyRule::Bollinger { .. } => bollinger_positions(series.bars(), indicators),
            StrategyRule::Rsi { low, high, .. } => threshold_positions(indicators, low, high),
            _ => crossover_positions(indicators),
        };
        positions.resize(series.len(), Position::Flat);
        positions
    }

    pub fn positions(&self, series: &PriceSeries) -> PositionSeries {
        self.generate(series, &self.compute(series))
    }
}

impl fmt::Display for StrategyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.indicator_type())
    }
}

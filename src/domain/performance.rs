//! Strategy returns, the buy-and-hold baseline, and summary statistics.
//!
//! All returns are log returns. The position at bar `t - 1` earns the
//! market return of bar `t`; a position change at bar `t` pays the
//! per-trade cost at bar `t`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::signal::{count_trades, Position};

/// Scalar a backtest is scored by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Objective {
    /// Final cumulative strategy multiple.
    #[default]
    Multiple,
    /// Strategy multiple minus buy-and-hold multiple.
    Outperformance,
    /// Annualized Sharpe ratio of the strategy log returns.
    Sharpe,
}

impl Objective {
    pub const ALL: [Objective; 3] = [
        Objective::Multiple,
        Objective::Outperformance,
        Objective::Sharpe,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Objective::Multiple => "multiple",
            Objective::Outperformance => "outperformance",
            Objective::Sharpe => "sharpe",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Objective {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Objective::ALL
            .into_iter()
            .find(|o| o.name() == lower)
            .ok_or_else(|| BacktestError::ConfigInvalid {
                section: "backtest".into(),
                key: "objective".into(),
                reason: format!(
                    "unknown objective '{}', expected multiple, outperformance or sharpe",
                    s
                ),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationConfig {
    /// Log-return cost charged per unit of position change.
    pub cost_per_trade: f64,
    pub objective: Objective,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            cost_per_trade: 0.0,
            objective: Objective::Multiple,
        }
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<(), BacktestError> {
        if !self.cost_per_trade.is_finite() || self.cost_per_trade < 0.0 {
            return Err(BacktestError::InvalidParameter {
                key: "TC".into(),
                reason: format!(
                    "cost per trade must be finite and non-negative, got {}",
                    self.cost_per_trade
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceResult {
    pub timestamps: Vec<NaiveDateTime>,
    pub positions: Vec<Position>,
    pub market_returns: Vec<f64>,
    pub strategy_returns: Vec<f64>,
    pub cumulative_market: Vec<f64>,
    pub cumulative_strategy: Vec<f64>,
    pub strategy_multiple: f64,
    pub market_multiple: f64,
    pub outperformance: f64,
    pub trades: usize,
    pub objective: Objective,
    pub metric: f64,
    pub stats: SummaryStats,
}

pub fn evaluate(
    series: &PriceSeries,
    positions: &[Position],
    config: &EvaluationConfig,
) -> Result<PerformanceResult, BacktestError> {
    config.validate()?;
    series.require_bars(2)?;
    if positions.len() != series.len() {
        return Err(BacktestError::InvalidSeries {
            symbol: series.symbol().to_string(),
            reason: format!(
                "{} positions for {} bars",
                positions.len(),
                series.len()
            ),
        });
    }

    let market_returns = series.log_returns();
    let mut prev = Position::Flat;
    let strategy_returns: Vec<f64> = positions
        .iter()
        .zip(&market_returns)
        .map(|(&pos, &m)| {
            let turnover = f64::from((pos.value() - prev.value()).abs());
            let r = prev.as_f64() * m - config.cost_per_trade * turnover;
            prev = pos;
            r
        })
        .collect();

    let cumulative_market = cumulative(&market_returns);
    let cumulative_strategy = cumulative(&strategy_returns);
    let market_multiple = cumulative_market.last().copied().unwrap_or(1.0);
    let strategy_multiple = cumulative_strategy.last().copied().unwrap_or(1.0);
    let outperformance = strategy_multiple - market_multiple;

    let bars_per_year = series.granularity().bars_per_year();
    let stats = summary_stats(&strategy_returns, &cumulative_strategy, bars_per_year);

    let metric = match config.objective {
        Objective::Multiple => strategy_multiple,
        Objective::Outperformance => outperformance,
        Objective::Sharpe => stats.sharpe_ratio,
    };

    Ok(PerformanceResult {
        timestamps: series.timestamps(),
        positions: positions.to_vec(),
        market_returns,
        strategy_returns,
        cumulative_market,
        cumulative_strategy,
        strategy_multiple,
        market_multiple,
        outperformance,
        trades: count_trades(positions),
        objective: config.objective,
        metric,
        stats,
    })
}

/// exp of the running sum of log returns.
fn cumulative(returns: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    returns
        .iter()
        .map(|r| {
            total += r;
            total.exp()
        })
        .collect()
}

fn summary_stats(returns: &[f64], cumulative: &[f64], bars_per_year: f64) -> SummaryStats {
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let years = (returns.len() - 1) as f64 / bars_per_year;
    let multiple = cumulative.last().copied().unwrap_or(1.0);
    let annualized_return = if years > 0.0 {
        multiple.powf(1.0 / years) - 1.0
    } else {
        0.0
    };

    let sharpe_ratio = if stddev > 0.0 {
        mean / stddev * bars_per_year.sqrt()
    } else {
        0.0
    };

    SummaryStats {
        annualized_return,
        annualized_volatility: stddev * bars_per_year.sqrt(),
        sharpe_ratio,
        max_drawdown: max_drawdown(cumulative),
    }
}

/// Largest peak-to-trough decline of a multiple curve that starts at 1.0.
fn max_drawdown(cumulative: &[f64]) -> f64 {
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;
    for &value in cumulative {
        if value > peak {
            peak = value;
        } else {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }
    max_dd
}

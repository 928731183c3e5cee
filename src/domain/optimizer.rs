//! Exhaustive grid search over strategy parameters.
//!
//! Parameter names are enumerated in lexicographic order and the grid is
//! walked like an odometer: the last name varies fastest and every range
//! ascends. The winner is the first combination reaching the maximum
//! metric, so parallel and sequential runs agree exactly.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::params::ParameterSet;
use crate::domain::performance::{evaluate, EvaluationConfig, PerformanceResult};
use crate::domain::strategy::{StrategyKind, StrategyRule};

const STEP_TOLERANCE: f64 = 1e-9;

/// Upper bound on the values of one range and on the combinations of a
/// whole grid. Larger searches fail with `InvalidRange` before allocating.
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// Inclusive arithmetic progression `start, start + step, ..., stop`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl ParameterRange {
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    /// A range holding exactly one value.
    pub fn single(value: f64) -> Self {
        Self::new(value, value, 1.0)
    }

    /// Expand the range, failing with `InvalidRange` (reported against
    /// `key`) when it does not describe a clean progression.
    pub fn values(&self, key: &str) -> Result<Vec<f64>, BacktestError> {
        let invalid = |reason: String| BacktestError::InvalidRange {
            key: key.to_string(),
            reason,
        };

        if !(self.start.is_finite() && self.stop.is_finite() && self.step.is_finite()) {
            return Err(invalid(format!("{} has a non-finite bound", self)));
        }
        if self.step <= 0.0 {
            return Err(invalid(format!("step must be positive, got {}", self.step)));
        }
        if self.stop < self.start {
            return Err(invalid(format!(
                "stop {} is below start {}",
                self.stop, self.start
            )));
        }

        let span = self.stop - self.start;
        let steps = (span / self.step).round();
        if (steps * self.step - span).abs() > STEP_TOLERANCE * self.step {
            return Err(invalid(format!(
                "{} - {} is not a multiple of step {}",
                self.stop, self.start, self.step
            )));
        }

        if steps >= MAX_GRID_POINTS as f64 {
            return Err(invalid(format!(
                "{} expands to more than {} values",
                self, MAX_GRID_POINTS
            )));
        }

        let count = steps as usize + 1;
        Ok((0..count)
            .map(|i| {
                if i + 1 == count {
                    self.stop
                } else {
                    self.start + i as f64 * self.step
                }
            })
            .collect())
    }
}

impl fmt::Display for ParameterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.start, self.stop, self.step)
    }
}

/// Parses `start, stop, step`, optionally wrapped in parentheses.
impl FromStr for ParameterRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(trimmed);

        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!(
                "expected 'start, stop, step', got '{}'",
                s.trim()
            ));
        }

        let mut numbers = [0.0; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse::<f64>()
                .map_err(|e| format!("'{}' is not a number: {}", part, e))?;
        }
        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

/// Ranges keyed by parameter name.
pub type ParameterRanges = BTreeMap<String, ParameterRange>;

/// One evaluated combination.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub parameters: ParameterSet,
    pub metric: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub strategy: StrategyKind,
    pub best_parameters: ParameterSet,
    pub best_result: PerformanceResult,
    /// Every combination in enumeration order.
    pub grid: Vec<GridPoint>,
}

impl OptimizationResult {
    pub fn best_metric(&self) -> f64 {
        self.best_result.metric
    }
}

/// Expand `ranges` into every parameter combination for `strategy`, each
/// already validated into a rule.
pub fn build_grid(
    strategy: StrategyKind,
    ranges: &ParameterRanges,
) -> Result<Vec<(ParameterSet, StrategyRule)>, BacktestError> {
    let required: &[&str] = strategy.required_params();
    if let Some(key) = ranges.keys().find(|k| !required.contains(&k.as_str())) {
        return Err(BacktestError::UnknownParameter {
            strategy: strategy.name().to_string(),
            key: key.clone(),
        });
    }
    if let Some(key) = required.iter().find(|k| !ranges.contains_key(**k)) {
        return Err(BacktestError::MissingParameter {
            strategy: strategy.name().to_string(),
            key: key.to_string(),
        });
    }

    let axes: Vec<(&str, Vec<f64>)> = ranges
        .iter()
        .map(|(key, range)| range.values(key).map(|values| (key.as_str(), values)))
        .collect::<Result<_, _>>()?;

    let total = axes
        .iter()
        .try_fold(1usize, |acc, (_, values)| acc.checked_mul(values.len()))
        .filter(|&total| total <= MAX_GRID_POINTS)
        .ok_or_else(|| BacktestError::InvalidRange {
            key: strategy.name().to_string(),
            reason: format!("parameter grid exceeds {} combinations", MAX_GRID_POINTS),
        })?;
    let mut grid = Vec::with_capacity(total);
    let mut odometer = vec![0usize; axes.len()];

    for _ in 0..total {
        let parameters: ParameterSet = axes
            .iter()
            .zip(&odometer)
            .map(|((key, values), &i)| (key.to_string(), values[i]))
            .collect();
        let rule = strategy.rule(&parameters)?;
        grid.push((parameters, rule));

        for (digit, (_, values)) in odometer.iter_mut().zip(&axes).rev() {
            *digit += 1;
            if *digit < values.len() {
                break;
            }
            *digit = 0;
        }
    }

    Ok(grid)
}

/// Evaluate every combination of `ranges` on `series` and keep the best.
pub fn optimize(
    series: &PriceSeries,
    strategy: StrategyKind,
    ranges: &ParameterRanges,
    config: &EvaluationConfig,
) -> Result<OptimizationResult, BacktestError> {
    config.validate()?;
    series.require_bars(2)?;
    let grid = build_grid(strategy, ranges)?;
    info!(
        strategy = %strategy,
        combinations = grid.len(),
        objective = %config.objective,
        "optimizing"
    );

    let metrics = score_grid(series, &grid, config)?;
    let best = select_best(&metrics).ok_or_else(|| BacktestError::InvalidRange {
        key: strategy.name().to_string(),
        reason: "parameter grid is empty".into(),
    })?;

    let (best_parameters, best_rule) = &grid[best];
    let best_result = evaluate(series, &best_rule.positions(series), config)?;
    info!(
        strategy = %strategy,
        parameters = %best_parameters,
        metric = best_result.metric,
        "optimum found"
    );

    let best_parameters = best_parameters.clone();
    let grid = grid
        .into_iter()
        .zip(metrics)
        .map(|((parameters, _), metric)| GridPoint { parameters, metric })
        .collect();

    Ok(OptimizationResult {
        strategy,
        best_parameters,
        best_result,
        grid,
    })
}

fn score(
    series: &PriceSeries,
    parameters: &ParameterSet,
    rule: &StrategyRule,
    config: &EvaluationConfig,
) -> Result<f64, BacktestError> {
    let metric = evaluate(series, &rule.positions(series), config)?.metric;
    debug!(parameters = %parameters, metric, "grid point");
    Ok(metric)
}

#[cfg(feature = "parallel")]
fn score_grid(
    series: &PriceSeries,
    grid: &[(ParameterSet, StrategyRule)],
    config: &EvaluationConfig,
) -> Result<Vec<f64>, BacktestError> {
    use rayon::prelude::*;

    grid.par_iter()
        .map(|(parameters, rule)| score(series, parameters, rule, config))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn score_grid(
    series: &PriceSeries,
    grid: &[(ParameterSet, StrategyRule)],
    config: &EvaluationConfig,
) -> Result<Vec<f64>, BacktestError> {
    grid.iter()
        .map(|(parameters, rule)| score(series, parameters, rule, config))
        .collect()
}

/// Index of the first maximal metric. NaN never beats a number.
fn select_best(metrics: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &metric) in metrics.iter().enumerate() {
        let better = match best {
            None => true,
            Some(b) => metric > metrics[b] || (metrics[b].is_nan() && !metric.is_nan()),
        };
        if better {
            best = Some(i);
        }
    }
    best
}

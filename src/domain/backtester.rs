//! Backtester facade: configuration, lifecycle and orchestration.
//!
//! ```text
//! Created --strategy_setup--> Configured --strategy_results--> Evaluated
//!                                  \                            ^   |
//!                                   `--optimize_parameters--> Optimized
//! ```
//!
//! `strategy_setup` may be called again from any state and starts over.
//! Every operation validates before it mutates, so a failed call leaves
//! the state, parameters and stored results as they were.

use std::fmt;
use std::mem;

use tracing::info;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::BacktestError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::optimizer::{optimize, OptimizationResult, ParameterRanges};
use crate::domain::params::{is_known_parameter, ParameterSet};
use crate::domain::performance::{evaluate, PerformanceResult};
use crate::domain::strategy::{StrategyKind, StrategyRule};
use crate::ports::chart_port::{ChartPort, PerformanceChart};
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Configured,
    Evaluated,
    Optimized,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::Configured => "configured",
            LifecycleState::Evaluated => "evaluated",
            LifecycleState::Optimized => "optimized",
        };
        f.write_str(name)
    }
}

enum Stage {
    Created,
    Configured {
        series: PriceSeries,
    },
    Evaluated {
        series: PriceSeries,
        result: PerformanceResult,
    },
    Optimized {
        series: PriceSeries,
        optimization: OptimizationResult,
    },
}

pub struct Backtester<P: DataPort> {
    config: BacktestConfig,
    strategy: StrategyKind,
    data_port: P,
    stage: Stage,
}

impl<P: DataPort> Backtester<P> {
    pub fn new(config: BacktestConfig, data_port: P) -> Result<Self, BacktestError> {
        let strategy: StrategyKind = config.strategy.parse()?;
        if let Some(key) = config.options.keys().find(|k| !is_known_parameter(k)) {
            return Err(BacktestError::UnknownParameter {
                strategy: strategy.name().to_string(),
                key: key.to_string(),
            });
        }
        config.evaluation().validate()?;
        config.validate_dates()?;

        Ok(Self {
            config,
            strategy,
            data_port,
            stage: Stage::Created,
        })
    }

    pub fn state(&self) -> LifecycleState {
        match self.stage {
            Stage::Created => LifecycleState::Created,
            Stage::Configured { .. } => LifecycleState::Configured,
            Stage::Evaluated { .. } => LifecycleState::Evaluated,
            Stage::Optimized { .. } => LifecycleState::Optimized,
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// All configured option values, across strategies.
    pub fn options(&self) -> &ParameterSet {
        &self.config.options
    }

    /// The current values of `strategy`'s own parameters.
    pub fn parameters(&self, strategy: StrategyKind) -> ParameterSet {
        self.config.options.restricted_to(strategy.required_params())
    }

    pub fn price_series(&self) -> Option<&PriceSeries> {
        match &self.stage {
            Stage::Created => None,
            Stage::Configured { series }
            | Stage::Evaluated { series, .. }
            | Stage::Optimized { series, .. } => Some(series),
        }
    }

    pub fn results(&self) -> Option<&PerformanceResult> {
        match &self.stage {
            Stage::Evaluated { result, .. } => Some(result),
            Stage::Optimized { optimization, .. } => Some(&optimization.best_result),
            _ => None,
        }
    }

    pub fn optimization(&self) -> Option<&OptimizationResult> {
        match &self.stage {
            Stage::Optimized { optimization, .. } => Some(optimization),
            _ => None,
        }
    }

    /// Validate `strategy` and its options, then fetch fresh prices.
    pub fn strategy_setup(&mut self, strategy: &str) -> Result<(), BacktestError> {
        let kind: StrategyKind = strategy.parse()?;
        self.rule_for(kind)?;

        let series = self.data_port.fetch_prices(
            &self.config.symbol,
            self.config.start_date,
            self.config.end_date,
            self.config.granularity,
        )?;
        series.require_bars(2)?;

        info!(
            symbol = %self.config.symbol,
            strategy = %kind,
            bars = series.len(),
            "backtester configured"
        );
        self.strategy = kind;
        self.stage = Stage::Configured { series };
        Ok(())
    }

    /// Run `strategy` with the current options over the loaded prices.
    pub fn strategy_results(&mut self, strategy: &str) -> Result<&PerformanceResult, BacktestError> {
        let kind: StrategyKind = strategy.parse()?;
        let series = self.price_series().ok_or(BacktestError::NotConfigured)?;
        let rule = self.rule_for(kind)?;
        let result = evaluate(series, &rule.positions(series), &self.config.evaluation())?;

        info!(
            strategy = %kind,
            parameters = %self.parameters(kind),
            multiple = result.strategy_multiple,
            outperformance = result.outperformance,
            "strategy evaluated"
        );
        let series = self.take_series().ok_or(BacktestError::NotConfigured)?;
        self.strategy = kind;
        self.stage = Stage::Evaluated { series, result };
        self.results().ok_or(BacktestError::NoResults)
    }

    /// Grid-search `strategy` over `ranges` and adopt the best parameters.
    pub fn optimize_parameters(
        &mut self,
        strategy: &str,
        ranges: &ParameterRanges,
    ) -> Result<&OptimizationResult, BacktestError> {
        let kind: StrategyKind = strategy.parse()?;
        let series = self.price_series().ok_or(BacktestError::NotConfigured)?;
        let optimization = optimize(series, kind, ranges, &self.config.evaluation())?;

        let series = self.take_series().ok_or(BacktestError::NotConfigured)?;
        self.config.options.merge(&optimization.best_parameters);
        self.strategy = kind;
        self.stage = Stage::Optimized {
            series,
            optimization,
        };
        self.optimization().ok_or(BacktestError::NoResults)
    }

    /// Hand the latest result's cumulative curves to `chart`.
    pub fn plot_results(&self, chart: &dyn ChartPort) -> Result<(), BacktestError> {
        let result = self.results().ok_or(BacktestError::NoResults)?;
        chart.render(&PerformanceChart {
            title: self.title(),
            timestamps: result.timestamps.clone(),
            buy_and_hold: result.cumulative_market.clone(),
            strategy: result.cumulative_strategy.clone(),
        })
    }

    /// `SYMBOL | STRATEGY | START | END | GRANULARITY`
    pub fn title(&self) -> String {
        format!(
            "{} | {} | {} | {} | {}",
            self.config.symbol,
            self.strategy,
            self.config.start_date,
            self.config.end_date,
            self.config.granularity
        )
    }

    fn rule_for(&self, kind: StrategyKind) -> Result<StrategyRule, BacktestError> {
        kind.rule(&self.parameters(kind))
    }

    fn take_series(&mut self) -> Option<PriceSeries> {
        match mem::replace(&mut self.stage, Stage::Created) {
            Stage::Created => None,
            Stage::Configured { series }
            | Stage::Evaluated { series, .. }
            | Stage::Optimized { series, .. } => Some(series),
        }
    }
}

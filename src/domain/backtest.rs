//! Backtest configuration.

use chrono::NaiveDate;

use crate::domain::error::BacktestError;
use crate::domain::granularity::Granularity;
use crate::domain::params::ParameterSet;
use crate::domain::performance::{EvaluationConfig, Objective};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbol: String,
    pub strategy: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub granularity: Granularity,
    /// Parameter values for any of the supported strategies.
    pub options: ParameterSet,
    pub cost_per_trade: f64,
    pub objective: Objective,
}

impl BacktestConfig {
    pub fn new(
        symbol: impl Into<String>,
        strategy: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        granularity: Granularity,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            strategy: strategy.into(),
            start_date,
            end_date,
            granularity,
            options: ParameterSet::new(),
            cost_per_trade: 0.0,
            objective: Objective::default(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: f64) -> Self {
        self.options.insert(key, value);
        self
    }

    pub fn with_cost(mut self, cost_per_trade: f64) -> Self {
        self.cost_per_trade = cost_per_trade;
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn evaluation(&self) -> EvaluationConfig {
        EvaluationConfig {
            cost_per_trade: self.cost_per_trade,
            objective: self.objective,
        }
    }

    pub fn validate_dates(&self) -> Result<(), BacktestError> {
        if self.start_date > self.end_date {
            return Err(BacktestError::ConfigInvalid {
                section: "backtest".into(),
                key: "start_date".into(),
                reason: format!(
                    "start_date {} is after end_date {}",
                    self.start_date, self.end_date
                ),
            });
        }
        Ok(())
    }
}

//! Configuration loading and validation.
//!
//! Reads the `[backtest]`, `[parameters]` and `[optimize]` sections into
//! typed values. Every check that needs no price data runs here, so a
//! config can be validated without touching the data source.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::BacktestError;
use crate::domain::granularity::Granularity;
use crate::domain::optimizer::{build_grid, ParameterRange, ParameterRanges};
use crate::domain::params::{is_known_parameter, ParameterSet};
use crate::domain::performance::Objective;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const BACKTEST: &str = "backtest";
pub const PARAMETERS: &str = "parameters";
pub const OPTIMIZE: &str = "optimize";
pub const REPORT: &str = "report";

const RANGE_SUFFIX: &str = "_RANGE";

/// Check everything the config describes: fields, strategy options and,
/// when an `[optimize]` section is present, every grid combination.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let backtest = load_backtest_config(config)?;
    let strategy: StrategyKind = backtest.strategy.parse()?;
    let ranges = load_parameter_ranges(config)?;

    if ranges.is_empty() {
        strategy.rule(&backtest.options.restricted_to(strategy.required_params()))?;
    } else {
        build_grid(strategy, &ranges)?;
    }
    Ok(())
}

pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    let symbol = require_string(config, BACKTEST, "symbol")?;
    let strategy = require_string(config, BACKTEST, "strategy")?;
    strategy.parse::<StrategyKind>()?;

    let start_date = parse_date(config.get_string(BACKTEST, "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string(BACKTEST, "end_date").as_deref(), "end_date")?;

    let granularity: Granularity = config
        .get_string(BACKTEST, "granularity")
        .as_deref()
        .unwrap_or("D")
        .parse()?;

    let objective: Objective = match config.get_string(BACKTEST, "objective") {
        Some(value) => value.parse()?,
        None => Objective::default(),
    };

    let cost_per_trade = validate_cost(config)?;
    let options = load_options(config)?;

    let backtest = BacktestConfig {
        symbol,
        strategy,
        start_date,
        end_date,
        granularity,
        options,
        cost_per_trade,
        objective,
    };
    backtest.validate_dates()?;
    Ok(backtest)
}

/// `[parameters]` as a parameter set. Names are matched case-insensitively.
pub fn load_options(config: &dyn ConfigPort) -> Result<ParameterSet, BacktestError> {
    let mut options = ParameterSet::new();
    for key in config.keys(PARAMETERS) {
        let name = key.to_ascii_uppercase();
        if !is_known_parameter(&name) {
            return Err(BacktestError::ConfigInvalid {
                section: PARAMETERS.into(),
                key,
                reason: "not a strategy parameter".into(),
            });
        }
        let value = parse_number(config, PARAMETERS, &key)?;
        options.insert(name, value);
    }
    Ok(options)
}

/// `[optimize]` entries of the form `<PARAM>_RANGE = start, stop, step`.
pub fn load_parameter_ranges(config: &dyn ConfigPort) -> Result<ParameterRanges, BacktestError> {
    let mut ranges = ParameterRanges::new();
    for key in config.keys(OPTIMIZE) {
        let upper = key.to_ascii_uppercase();
        let name = upper
            .strip_suffix(RANGE_SUFFIX)
            .filter(|name| is_known_parameter(name))
            .ok_or_else(|| BacktestError::ConfigInvalid {
                section: OPTIMIZE.into(),
                key: key.clone(),
                reason: "expected <PARAM>_RANGE for a strategy parameter".into(),
            })?;

        let raw = require_string(config, OPTIMIZE, &key)?;
        let range: ParameterRange = raw.parse().map_err(|reason| BacktestError::ConfigInvalid {
            section: OPTIMIZE.into(),
            key: key.clone(),
            reason,
        })?;
        ranges.insert(name.to_string(), range);
    }
    Ok(ranges)
}

fn validate_cost(config: &dyn ConfigPort) -> Result<f64, BacktestError> {
    if config.get_string(BACKTEST, "cost_per_trade").is_none() {
        return Ok(0.0);
    }
    let value = parse_number(config, BACKTEST, "cost_per_trade")?;
    if value < 0.0 {
        return Err(BacktestError::ConfigInvalid {
            section: BACKTEST.into(),
            key: "cost_per_trade".into(),
            reason: "cost_per_trade must be non-negative".into(),
        });
    }
    Ok(value)
}

fn require_string(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, BacktestError> {
    config
        .get_string(section, key)
        .ok_or_else(|| BacktestError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })
}

fn parse_number(config: &dyn ConfigPort, section: &str, key: &str) -> Result<f64, BacktestError> {
    let raw = require_string(config, section, key)?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| BacktestError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("'{}' is not a finite number", raw),
        })
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, BacktestError> {
    match value {
        None => Err(BacktestError::ConfigMissing {
            section: BACKTEST.to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            BacktestError::ConfigInvalid {
                section: BACKTEST.to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

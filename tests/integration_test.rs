//! End-to-end properties of the evaluation and optimization engine.
//!
//! Tests cover:
//! - Determinism and absence of look-ahead for every strategy family
//! - Exhaustive grid search picks a true optimum
//! - Windows longer than the series, flat prices and trading costs
//! - Backtester lifecycle through a mock data port

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use vectrader::domain::backtester::{Backtester, LifecycleState};
use vectrader::domain::error::BacktestError;
use vectrader::domain::optimizer::{build_grid, optimize, ParameterRange, ParameterRanges};
use vectrader::domain::params::ParameterSet;
use vectrader::domain::performance::{evaluate, EvaluationConfig, Objective};
use vectrader::domain::signal::{count_trades, Position};
use vectrader::domain::strategy::{StrategyKind, StrategyRule};

fn default_parameters(kind: StrategyKind) -> ParameterSet {
    all_options(sample_config(kind.name()))
        .options
        .restricted_to(kind.required_params())
}

fn rule(kind: StrategyKind) -> StrategyRule {
    kind.rule(&default_parameters(kind)).unwrap()
}

fn ranges(entries: &[(&str, f64, f64, f64)]) -> ParameterRanges {
    entries
        .iter()
        .map(|&(key, start, stop, step)| (key.to_string(), ParameterRange::new(start, stop, step)))
        .collect()
}

mod properties {
    use super::*;

    proptest! {
        #[test]
        fn evaluation_is_deterministic(
            closes in prop::collection::vec(50.0f64..150.0, 20..80),
            cost in 0.0f64..0.01,
        ) {
            let series = make_series(&closes);
            let config = EvaluationConfig { cost_per_trade: cost, objective: Objective::Multiple };
            for kind in StrategyKind::ALL {
                let rule = rule(kind);
                let first = evaluate(&series, &rule.positions(&series), &config).unwrap();
                let second = evaluate(&series, &rule.positions(&series), &config).unwrap();
                prop_assert_eq!(first, second);
            }
        }

        #[test]
        fn positions_ignore_later_prices(
            closes in prop::collection::vec(50.0f64..150.0, 30..80),
            cut in 0usize..30,
            replacement in prop::collection::vec(50.0f64..150.0, 80),
        ) {
            let mut mutated = closes.clone();
            for (price, new) in mutated.iter_mut().skip(cut + 1).zip(&replacement) {
                *price = *new;
            }
            let original = make_series(&closes);
            let changed = make_series(&mutated);

            for kind in StrategyKind::ALL {
                let rule = rule(kind);
                let before = rule.positions(&original);
                let after = rule.positions(&changed);
                prop_assert_eq!(&before[..=cut], &after[..=cut], "{} looked ahead", kind);

                // Return at cut+1 is earned by the position formed at cut.
                let config = EvaluationConfig::default();
                let a = evaluate(&original, &before, &config).unwrap();
                let b = evaluate(&changed, &after, &config).unwrap();
                prop_assert_eq!(&a.strategy_returns[..=cut], &b.strategy_returns[..=cut]);
            }
        }

        #[test]
        fn optimum_beats_every_combination(
            closes in prop::collection::vec(50.0f64..150.0, 40..80),
        ) {
            let series = make_series(&closes);
            let ranges = ranges(&[("SMA_S", 2.0, 6.0, 2.0), ("SMA_L", 8.0, 16.0, 4.0)]);
            let result = optimize(
                &series,
                StrategyKind::SmaCross,
                &ranges,
                &EvaluationConfig::default(),
            ).unwrap();

            prop_assert_eq!(result.grid.len(), 9);
            for point in &result.grid {
                prop_assert!(result.best_metric() >= point.metric);
            }
        }
    }
}

mod grid_search {
    use super::*;

    #[test]
    fn sma_range_expands_to_five_points() {
        let grid = build_grid(StrategyKind::Sma, &ranges(&[("SMA", 10.0, 30.0, 5.0)])).unwrap();
        let windows: Vec<f64> = grid.iter().map(|(p, _)| p.get("SMA").unwrap()).collect();
        assert_eq!(windows, vec![10.0, 15.0, 20.0, 25.0, 30.0]);
    }

    #[test]
    fn best_result_matches_direct_evaluation() {
        let series = make_series(&wave(150));
        let config = EvaluationConfig {
            cost_per_trade: 0.0005,
            objective: Objective::Outperformance,
        };
        let result = optimize(
            &series,
            StrategyKind::Bollinger,
            &ranges(&[("SMA", 10.0, 30.0, 10.0), ("DEV", 1.0, 2.0, 0.5)]),
            &config,
        )
        .unwrap();

        let rule = StrategyKind::Bollinger.rule(&result.best_parameters).unwrap();
        let direct = evaluate(&series, &rule.positions(&series), &config).unwrap();
        assert_eq!(direct, result.best_result);

        let best_in_grid = result
            .grid
            .iter()
            .find(|p| p.parameters == result.best_parameters)
            .unwrap();
        assert_eq!(best_in_grid.metric, result.best_metric());
    }

    #[test]
    fn incomplete_ranges_are_rejected() {
        let series = make_series(&wave(60));
        let err = optimize(
            &series,
            StrategyKind::Macd,
            &ranges(&[("EMA_S", 5.0, 10.0, 5.0)]),
            &EvaluationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BacktestError::MissingParameter { .. }));
    }
}

mod edge_cases {
    use super::*;

    #[test]
    fn window_longer_than_series_stays_flat() {
        let series = make_series(&wave(50));
        let rule = StrategyKind::Sma
            .rule(&ParameterSet::new().with("SMA", 200.0))
            .unwrap();
        let positions = rule.positions(&series);
        assert!(positions.iter().all(|&p| p == Position::Flat));

        let result = evaluate(&series, &positions, &EvaluationConfig::default()).unwrap();
        assert!(result.strategy_returns.iter().all(|&r| r == 0.0));
        assert_eq!(result.strategy_multiple, 1.0);
        assert_eq!(result.trades, 0);
    }

    #[test]
    fn window_equal_to_series_length_stays_flat() {
        let series = make_series(&wave(30));
        let rule = StrategyKind::SmaCross
            .rule(&ParameterSet::new().with("SMA_S", 5.0).with("SMA_L", 30.0))
            .unwrap();
        assert!(rule.positions(&series).iter().all(|&p| p == Position::Flat));
    }

    #[test]
    fn flat_prices_earn_nothing_for_every_strategy() {
        let series = make_series(&flat(100.0, 60));
        for kind in StrategyKind::ALL {
            let positions = rule(kind).positions(&series);
            let result = evaluate(&series, &positions, &EvaluationConfig::default()).unwrap();
            assert!(
                result.strategy_returns.iter().all(|&r| r == 0.0),
                "{} earned on flat prices",
                kind
            );
            assert_eq!(result.market_multiple, 1.0);
            assert_eq!(result.strategy_multiple, 1.0);
        }
    }

    #[test]
    fn linear_rise_goes_long_after_warmup() {
        let closes = linear(100.0, 150.0, 252);
        let series = make_series(&closes);
        let rule = StrategyKind::Sma
            .rule(&ParameterSet::new().with("SMA", 20.0))
            .unwrap();
        let positions = rule.positions(&series);
        assert!(positions[..19].iter().all(|&p| p == Position::Flat));
        assert!(positions[19..].iter().all(|&p| p == Position::Long));

        let result = evaluate(&series, &positions, &EvaluationConfig::default()).unwrap();
        assert_relative_eq!(result.market_multiple, 1.5, epsilon = 1e-9);
        assert_relative_eq!(result.strategy_multiple, 150.0 / closes[19], epsilon = 1e-9);
        assert!(result.strategy_multiple > 1.0);
        assert!(result.strategy_multiple <= result.market_multiple);
        assert_eq!(result.trades, 1);
    }

    #[test]
    fn higher_costs_strictly_lower_the_metric() {
        let series = make_series(&wave(200));
        for kind in StrategyKind::ALL {
            let positions = rule(kind).positions(&series);
            assert!(count_trades(&positions) > 0, "{} never trades", kind);

            let mut previous = f64::INFINITY;
            for cost in [0.0, 0.0001, 0.001, 0.01] {
                let config = EvaluationConfig {
                    cost_per_trade: cost,
                    objective: Objective::Multiple,
                };
                let metric = evaluate(&series, &positions, &config).unwrap().metric;
                assert!(metric < previous, "{} did not pay cost {}", kind, cost);
                previous = metric;
            }
        }
    }

    #[test]
    fn flat_prices_with_costs_earn_nothing() {
        let series = make_series(&flat(100.0, 60));
        let config = EvaluationConfig {
            cost_per_trade: 0.001,
            objective: Objective::Multiple,
        };
        for kind in StrategyKind::ALL {
            let positions = rule(kind).positions(&series);
            assert_eq!(count_trades(&positions), 0, "{} traded on flat prices", kind);
            let result = evaluate(&series, &positions, &config).unwrap();
            assert_eq!(result.strategy_multiple, 1.0, "{} paid fees", kind);
        }
    }

    #[test]
    fn rsi_on_flat_prices_stays_flat() {
        let series = make_series(&flat(100.0, 60));
        let rule = StrategyKind::Rsi
            .rule(
                &ParameterSet::new()
                    .with("PERIODS", 14.0)
                    .with("RSI_LOW", 30.0)
                    .with("RSI_HIGH", 70.0),
            )
            .unwrap();
        let positions = rule.positions(&series);
        assert!(positions.iter().all(|&p| p == Position::Flat));

        let config = EvaluationConfig {
            cost_per_trade: 0.001,
            objective: Objective::Multiple,
        };
        let result = evaluate(&series, &positions, &config).unwrap();
        assert_eq!(result.trades, 0);
        assert_eq!(result.strategy_multiple, 1.0);
        assert_eq!(result.market_multiple, 1.0);
    }
}

mod lifecycle {
    use super::*;

    fn backtester(port: MockDataPort) -> Backtester<MockDataPort> {
        Backtester::new(all_options(sample_config("SMA")), port).unwrap()
    }

    #[test]
    fn full_run_through_mock_port() {
        let mut bt = backtester(MockDataPort::new().with_prices(wave(120)));
        assert_eq!(bt.state(), LifecycleState::Created);

        bt.strategy_setup("sma").unwrap();
        assert_eq!(bt.state(), LifecycleState::Configured);
        assert_eq!(bt.price_series().unwrap().len(), 120);

        let multiple = bt.strategy_results("SMA").unwrap().strategy_multiple;
        assert_eq!(bt.state(), LifecycleState::Evaluated);
        assert!(multiple.is_finite());

        let ranges = ranges(&[("SMA", 5.0, 25.0, 5.0)]);
        let optimization = bt.optimize_parameters("SMA", &ranges).unwrap();
        assert_eq!(optimization.grid.len(), 5);
        let best = optimization.best_parameters.get("SMA").unwrap();
        assert_eq!(bt.state(), LifecycleState::Optimized);
        assert_eq!(bt.options().get("SMA"), Some(best));
    }

    #[test]
    fn results_before_setup_fail() {
        let mut bt = backtester(MockDataPort::new().with_prices(wave(50)));
        assert!(matches!(
            bt.strategy_results("SMA"),
            Err(BacktestError::NotConfigured)
        ));
        assert_eq!(bt.state(), LifecycleState::Created);
    }

    #[test]
    fn failed_fetch_leaves_backtester_untouched() {
        let mut bt = backtester(MockDataPort::new().with_error("feed offline"));
        let err = bt.strategy_setup("SMA").unwrap_err();
        assert!(matches!(err, BacktestError::DataUnavailable { .. }));
        assert_eq!(bt.state(), LifecycleState::Created);
        assert!(bt.price_series().is_none());
    }

    #[test]
    fn failed_optimization_keeps_previous_results() {
        let mut bt = backtester(MockDataPort::new().with_prices(wave(80)));
        bt.strategy_setup("SMA").unwrap();
        let before = bt.strategy_results("SMA").unwrap().clone();

        let bad = ranges(&[("SMA", 30.0, 10.0, 5.0)]);
        let err = bt.optimize_parameters("SMA", &bad).unwrap_err();
        assert!(matches!(err, BacktestError::InvalidRange { .. }));
        assert_eq!(bt.state(), LifecycleState::Evaluated);
        assert_eq!(bt.results(), Some(&before));
        assert_eq!(bt.options().get("SMA"), Some(10.0));
    }

    #[test]
    fn switching_strategy_reuses_loaded_prices() {
        let port = MockDataPort::new().with_prices(wave(90));
        let mut bt = backtester(port);
        bt.strategy_setup("SMA").unwrap();
        bt.strategy_results("SMA").unwrap();
        bt.strategy_results("MACD").unwrap();
        assert_eq!(bt.strategy(), StrategyKind::Macd);
        assert!(bt.title().contains("| MACD |"));
    }
}

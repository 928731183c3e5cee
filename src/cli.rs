//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_chart::SvgChartAdapter;
use crate::domain::backtest::BacktestConfig;
use crate::domain::backtester::Backtester;
use crate::domain::config_validation::{
    load_backtest_config, load_parameter_ranges, validate_config, BACKTEST, OPTIMIZE, REPORT,
};
use crate::domain::error::BacktestError;
use crate::domain::optimizer::OptimizationResult;
use crate::domain::performance::PerformanceResult;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "vectrader", about = "Vectorized trading strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a strategy with the configured parameters
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Override [backtest] strategy
        #[arg(short, long)]
        strategy: Option<String>,
        /// Write an SVG performance chart here
        #[arg(long)]
        chart: Option<PathBuf>,
        /// Override [backtest] data_dir
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Grid-search the [optimize] ranges and report the best parameters
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(long)]
        chart: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Check a configuration without loading any data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List supported strategies and their parameters
    Strategies,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            strategy,
            chart,
            data_dir,
        } => run_backtest(&config, strategy.as_deref(), chart.as_deref(), data_dir.as_deref()),
        Command::Optimize {
            config,
            strategy,
            chart,
            data_dir,
        } => run_optimize(&config, strategy.as_deref(), chart.as_deref(), data_dir.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Strategies => run_strategies(),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Everything a run needs from the config file, with CLI overrides applied.
struct RunSetup {
    backtest: BacktestConfig,
    data_dir: PathBuf,
    chart_path: Option<PathBuf>,
}

fn prepare(
    adapter: &dyn ConfigPort,
    strategy_override: Option<&str>,
    chart_override: Option<&Path>,
    data_dir_override: Option<&Path>,
) -> Result<RunSetup, BacktestError> {
    let mut backtest = load_backtest_config(adapter)?;
    if let Some(strategy) = strategy_override {
        strategy.parse::<StrategyKind>()?;
        backtest.strategy = strategy.to_string();
    }

    let data_dir = data_dir_override
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string(BACKTEST, "data_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let chart_path = chart_override
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string(REPORT, "chart_path").map(PathBuf::from));

    Ok(RunSetup {
        backtest,
        data_dir,
        chart_path,
    })
}

fn setup_backtester(setup: &RunSetup) -> Result<Backtester<CsvAdapter>, BacktestError> {
    let strategy = setup.backtest.strategy.clone();
    let mut backtester = Backtester::new(
        setup.backtest.clone(),
        CsvAdapter::new(setup.data_dir.clone()),
    )?;
    eprintln!(
        "Loading {} {} bars from {}",
        setup.backtest.symbol,
        setup.backtest.granularity,
        setup.data_dir.display()
    );
    backtester.strategy_setup(&strategy)?;
    if let Some(series) = backtester.price_series() {
        eprintln!("  {} bars loaded", series.len());
    }
    Ok(backtester)
}

fn write_chart(backtester: &Backtester<CsvAdapter>, chart_path: Option<&Path>) -> Result<(), BacktestError> {
    if let Some(path) = chart_path {
        backtester.plot_results(&SvgChartAdapter::new(path.to_path_buf()))?;
        eprintln!("\nChart written to: {}", path.display());
    }
    Ok(())
}

fn run_backtest(
    config_path: &Path,
    strategy: Option<&str>,
    chart: Option<&Path>,
    data_dir: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let outcome = prepare(&adapter, strategy, chart, data_dir).and_then(|setup| {
        let mut backtester = setup_backtester(&setup)?;
        let strategy = setup.backtest.strategy.clone();
        print_result(backtester.title(), backtester.strategy_results(&strategy)?);
        write_chart(&backtester, setup.chart_path.as_deref())
    });

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_optimize(
    config_path: &Path,
    strategy: Option<&str>,
    chart: Option<&Path>,
    data_dir: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let outcome = prepare(&adapter, strategy, chart, data_dir).and_then(|setup| {
        let ranges = load_parameter_ranges(&adapter)?;
        if ranges.is_empty() {
            return Err(BacktestError::ConfigMissing {
                section: OPTIMIZE.into(),
                key: "<PARAM>_RANGE".into(),
            });
        }

        let mut backtester = setup_backtester(&setup)?;
        let strategy = setup.backtest.strategy.clone();
        let title = backtester.title();
        print_optimization(title, backtester.optimize_parameters(&strategy, &ranges)?);
        write_chart(&backtester, setup.chart_path.as_deref())
    });

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn print_result(title: String, result: &PerformanceResult) {
    eprintln!("\n=== {} ===", title);
    eprintln!("Strategy Multiple:  {:.4}", result.strategy_multiple);
    eprintln!("Buy & Hold Multiple:{:>7.4}", result.market_multiple);
    eprintln!("Outperformance:     {:+.4}", result.outperformance);
    eprintln!(
        "Annualized Return:  {:.2}%",
        result.stats.annualized_return * 100.0
    );
    eprintln!(
        "Annualized Vol:     {:.2}%",
        result.stats.annualized_volatility * 100.0
    );
    eprintln!("Sharpe Ratio:       {:.2}", result.stats.sharpe_ratio);
    eprintln!("Max Drawdown:       -{:.1}%", result.stats.max_drawdown * 100.0);
    eprintln!("Trades:             {}", result.trades);
    eprintln!("Metric ({}):{:>8.4}", result.objective, result.metric);
}

fn print_optimization(title: String, optimization: &OptimizationResult) {
    eprintln!(
        "\nEvaluated {} combinations for {}",
        optimization.grid.len(),
        optimization.strategy
    );
    eprintln!("Best parameters: {}", optimization.best_parameters);
    print_result(title, &optimization.best_result);
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    if !adapter.has_section(OPTIMIZE) {
        eprintln!("No [optimize] section: backtest only");
    }
    eprintln!("Config validated successfully");
    ExitCode::SUCCESS
}

fn run_strategies() -> ExitCode {
    for kind in StrategyKind::ALL {
        println!(
            "{:<10} {:<32} {}",
            kind.name(),
            kind.required_params().join(", "),
            kind.description()
        );
    }
    ExitCode::SUCCESS
}

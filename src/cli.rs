//! CLI definition and dispatch.

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::predictions_csv_adapter::CsvPredictionAdapter;
use crate::domain::backtest::{BacktestResult, run_backtest};
use crate::domain::config_validation::{AppConfig, load_app_config};
use crate::domain::error::SwarmtraderError;
use crate::domain::features::{
    LabelOracle, Standardizer, accuracy, build_features, build_labels, split_by_date,
};
use crate::domain::price_series::PriceSeries;
use crate::domain::representation::SwarmRepresentation;
use crate::domain::strategy::{
    BuyAndHoldStrategy, ClassicStrategy, MovingAverageCrossStrategy, OneMovingAverageStrategy,
    PredictionStrategy, Strategy, StrategyKind,
};
use crate::domain::swarm::{GlobalBestPso, OptimizationResult, SwarmPreset};
use crate::ports::data_port::PriceDataPort;
use crate::ports::prediction_port::PredictionSource;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "swarmtrader",
    version,
    about = "Backtester with particle-swarm tuned moving-average signals"
)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest one strategy over the test window
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// hold, classic, one-ma, ma-cross, prediction or pso
        #[arg(short, long)]
        strategy: StrategyKind,
        /// Report directory, overriding [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Tune the combined moving-average strategy on the train window and
    /// backtest the best candidate on the test window
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        /// standard or quick, overriding particle and iteration counts
        #[arg(long)]
        preset: Option<SwarmPreset>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build features and labels and export train/test datasets
    Labels {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Export datasets and run every strategy
    All {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Install the stderr log subscriber. Safe to call more than once.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Dispatch one subcommand.
pub fn execute(command: Command) -> Result<(), SwarmtraderError> {
    match command {
        Command::Backtest {
            config,
            strategy,
            output,
        } => Session::open(&config, output.as_deref())
            .and_then(|session| session.backtest(strategy).map(|_| ())),
        Command::Optimize {
            config,
            preset,
            output,
        } => Session::open(&config, output.as_deref()).and_then(|mut session| {
            if let Some(preset) = preset {
                session.apply_preset(preset);
            }
            session.backtest(StrategyKind::Swarm).map(|_| ())
        }),
        Command::Labels { config, output } => {
            Session::open(&config, output.as_deref()).and_then(|session| session.labels())
        }
        Command::Validate { config } => run_validate(&config),
        Command::All { config, output } => {
            Session::open(&config, output.as_deref()).and_then(|session| session.all())
        }
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, SwarmtraderError> {
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    load_app_config(&adapter)
}

fn run_validate(path: &Path) -> Result<(), SwarmtraderError> {
    let config = load_config(path)?;
    let split = &config.split;
    let swarm = &config.swarm;

    eprintln!("\nData:      {}", config.data_path);
    eprintln!("Train:     {} to {}", split.train_start, split.train_end);
    eprintln!("Test:      {} to {}", split.test_start, split.test_end);
    eprintln!(
        "Backtest:  cash {:.2}, commission {}, fill {}",
        config.backtest.initial_cash, config.backtest.execution.commission, config.backtest.fill
    );
    eprintln!(
        "Strategies: one-ma SMA({}), ma-cross {}, classic RSI({}) {}/{}",
        config.strategy.one_ma_period,
        config.strategy.cross,
        config.strategy.classic.rsi_period,
        config.strategy.classic.oversold,
        config.strategy.classic.overbought
    );
    eprintln!(
        "Swarm:     {} particles x {} iterations, seed {}, {} normalization, periods {:?}",
        swarm.swarm.n_particles,
        swarm.swarm.iters,
        swarm.swarm.seed,
        swarm.normalization,
        swarm.periods
    );
    eprintln!(
        "Labels:    gain {}, loss {}, n_day {}, epochs {}",
        config.labels.params.gain,
        config.labels.params.loss,
        config.labels.params.n_day,
        config.labels.epochs
    );
    eprintln!("\nConfiguration is valid");
    Ok(())
}

/// Loaded config, prices and report sink shared by every subcommand.
struct Session {
    config: AppConfig,
    series: PriceSeries,
    reports: CsvReportAdapter,
}

impl Session {
    fn open(config_path: &Path, output: Option<&Path>) -> Result<Self, SwarmtraderError> {
        let mut config = load_config(config_path)?;
        config.labels.predictions_path = config
            .labels
            .predictions_path
            .map(|p| resolve(config_path, &p).display().to_string());
        let data = CsvAdapter::new(resolve(config_path, &config.data_path));
        eprintln!("Loading prices from {}", data.source());
        let series = data.load_prices()?;

        let output_dir = match output {
            Some(dir) => dir.to_path_buf(),
            None => resolve(config_path, &config.output_dir),
        };
        Ok(Self {
            config,
            series,
            reports: CsvReportAdapter::new(output_dir),
        })
    }

    fn apply_preset(&mut self, preset: SwarmPreset) {
        let budget = preset.config();
        self.config.swarm.preset = preset;
        self.config.swarm.swarm.n_particles = budget.n_particles;
        self.config.swarm.swarm.iters = budget.iters;
    }

    fn test_window(&self) -> Result<PriceSeries, SwarmtraderError> {
        self.config.split.test(&self.series)
    }

    /// Run `kind` on the test window, print a summary and write its reports.
    fn backtest(&self, kind: StrategyKind) -> Result<BacktestResult, SwarmtraderError> {
        let result = match kind {
            StrategyKind::Swarm => self.optimize()?,
            _ => {
                let mut strategy = self.build_strategy(kind)?;
                let window = self.test_window()?;
                eprintln!(
                    "\nRunning {}: {} bars, {} to {}",
                    strategy.name(),
                    window.len(),
                    window.first_date(),
                    window.last_date()
                );
                run_backtest(&window, strategy.as_mut(), &self.config.backtest)?
            }
        };

        print_summary(&result);
        for path in self.reports.write(&result, kind.as_str())? {
            eprintln!("  wrote {}", path.display());
        }
        Ok(result)
    }

    fn build_strategy(&self, kind: StrategyKind) -> Result<Box<dyn Strategy>, SwarmtraderError> {
        let settings = &self.config.strategy;
        let strategy: Box<dyn Strategy> = match kind {
            StrategyKind::BuyAndHold => Box::new(BuyAndHoldStrategy::new()),
            StrategyKind::Classic => {
                Box::new(ClassicStrategy::new(&self.series, settings.classic)?)
            }
            StrategyKind::OneMovingAverage => Box::new(OneMovingAverageStrategy::new(
                &self.series,
                settings.one_ma_period,
            )?),
            StrategyKind::MovingAverageCross => {
                Box::new(MovingAverageCrossStrategy::new(&self.series, settings.cross)?)
            }
            StrategyKind::Prediction => {
                Box::new(PredictionStrategy::new(self.prediction_source()?))
            }
            StrategyKind::Swarm => {
                return Err(SwarmtraderError::invalid(
                    "strategy",
                    "kind",
                    "the swarm strategy is built by the optimizer",
                ));
            }
        };
        Ok(strategy)
    }

    /// Predictions CSV when configured, otherwise the true-label oracle.
    fn prediction_source(&self) -> Result<Arc<dyn PredictionSource>, SwarmtraderError> {
        match &self.config.labels.predictions_path {
            Some(path) => Ok(Arc::new(CsvPredictionAdapter::from_file(path)?)),
            None => {
                warn!("no [labels] predictions_path configured, trading on true labels");
                let labels = build_labels(&self.series, &self.config.labels.params);
                Ok(Arc::new(LabelOracle::new(&self.series, &labels)))
            }
        }
    }

    /// Swarm search on the train window, then one backtest of the winner on
    /// the test window.
    fn optimize(&self) -> Result<BacktestResult, SwarmtraderError> {
        let swarm = &self.config.swarm;
        let split = self.config.split;
        let representation = SwarmRepresentation::new(
            self.series.clone(),
            &swarm.periods,
            swarm.normalization,
            swarm.signal_mode,
            self.config.backtest,
        )?;
        let pso = GlobalBestPso::new(
            swarm.swarm,
            representation.dimensions(),
            representation.bounds(),
        )?;

        eprintln!(
            "\nOptimizing {} rules ({} preset): {} particles x {} iterations on {} to {}",
            representation.rules().len(),
            swarm.preset,
            swarm.swarm.n_particles,
            swarm.swarm.iters,
            split.train_start,
            split.train_end
        );
        let optimum: OptimizationResult = pso.optimize(|batch| {
            representation.cost_function(batch, split.train_start, split.train_end)
        })?;
        info!(best_cost = optimum.best_cost, "optimization finished");

        let params = representation.decode(&optimum.best_position)?;
        eprintln!("Train return:     {:.2}%", -optimum.best_cost * 100.0);
        eprintln!("Buy threshold:    {:.4}", params.buy_threshold);
        eprintln!("Sell threshold:   {:.4}", params.sell_threshold);
        for (rule, weight) in representation.rules().iter().zip(&params.weights) {
            eprintln!("  {:<16} {:+.4}", rule.to_string(), weight);
        }
        let path = self
            .reports
            .write_cost_history(&optimum.cost_history, StrategyKind::Swarm.as_str())?;
        eprintln!("  wrote {}", path.display());

        let mut strategy = representation.build_strategy(params)?;
        let window = self.test_window()?;
        run_backtest(&window, &mut strategy, &self.config.backtest)
    }

    fn labels(&self) -> Result<(), SwarmtraderError> {
        let params = &self.config.labels.params;
        params.validate()?;
        let labels = build_labels(&self.series, params);
        let matrix = build_features(&self.series);
        let (mut train, mut test) = split_by_date(&matrix, &labels, &self.config.split)?;

        eprintln!(
            "\nLabels: gain {:.2}%, loss {:.2}%, horizon {} bars",
            params.gain * 100.0,
            params.loss * 100.0,
            params.n_day
        );
        eprintln!(
            "  train: {} rows, {:.1}% rise",
            train.len(),
            train.rise_share() * 100.0
        );
        eprintln!(
            "  test:  {} rows, {:.1}% rise",
            test.len(),
            test.rise_share() * 100.0
        );

        if let Some(path) = &self.config.labels.predictions_path {
            let predictions = CsvPredictionAdapter::from_file(path)?;
            eprintln!(
                "  prediction accuracy: train {:.1}%, test {:.1}%",
                accuracy(&predictions, &train) * 100.0,
                accuracy(&predictions, &test) * 100.0
            );
        }

        let scaler = Standardizer::fit(&train.rows)?;
        train.rows = scaler.transform(&train.rows);
        test.rows = scaler.transform(&test.rows);
        for (partition, name) in [(&train, "train"), (&test, "test")] {
            let path = self.reports.write_dataset(&matrix.columns, partition, name)?;
            eprintln!("  wrote {}", path.display());
        }
        Ok(())
    }

    fn all(&self) -> Result<(), SwarmtraderError> {
        self.labels()?;
        let mut results = Vec::with_capacity(StrategyKind::ALL.len());
        for kind in StrategyKind::ALL {
            results.push((kind, self.backtest(kind)?));
        }

        eprintln!("\n=== Comparison ===");
        eprintln!(
            "{:<12} {:>10} {:>10} {:>8} {:>8}",
            "strategy", "return", "drawdown", "buys", "sells"
        );
        for (kind, result) in &results {
            eprintln!(
                "{:<12} {:>9.2}% {:>9.1}% {:>8} {:>8}",
                kind.as_str(),
                result.total_return() * 100.0,
                result.metrics.max_drawdown * 100.0,
                result.buys(),
                result.sells()
            );
        }
        Ok(())
    }
}

/// Relative paths in a config file are relative to that file.
fn resolve(config_path: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    config_path
        .parent()
        .map(|dir| dir.join(path))
        .unwrap_or_else(|| path.to_path_buf())
}

fn print_summary(result: &BacktestResult) {
    let metrics = &result.metrics;
    eprintln!("\n=== {} ===", result.strategy_name);
    eprintln!("Starting Value:   {:.2}", result.initial_value());
    eprintln!("Final Value:      {:.2}", result.final_value());
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", metrics.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Orders:           {} buys, {} sells", result.buys(), result.sells());
    if result.skipped_orders > 0 {
        eprintln!("Skipped Orders:   {}", result.skipped_orders);
    }
    eprintln!("Closed Trades:    {}", metrics.total_trades);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    if metrics.open_at_end {
        eprintln!("Position open at end of window");
    }
}

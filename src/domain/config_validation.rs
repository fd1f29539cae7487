//! Configuration loading and validation.
//!
//! Every section is read into a typed settings struct before any run starts,
//! so a bad value fails fast with the section and key that caused it.
//! Missing optional keys take their defaults; present but malformed keys are
//! errors.

use chrono::NaiveDate;
use std::str::FromStr;

use crate::domain::backtest::{BacktestConfig, DEFAULT_INITIAL_CASH, FillPrice};
use crate::domain::error::SwarmtraderError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::features::LabelParams;
use crate::domain::ma_rules::{MovingAverageRule, SignalMode};
use crate::domain::price_series::TrainTestSplit;
use crate::domain::representation::Normalization;
use crate::domain::strategy::ClassicParams;
use crate::domain::swarm::{SwarmConfig, SwarmOptions, SwarmPreset};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_PERIODS: [usize; 4] = [5, 10, 20, 50];
pub const DEFAULT_TRAIN_YEARS: i32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategySettings {
    pub one_ma_period: usize,
    pub cross: MovingAverageRule,
    pub classic: ClassicParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwarmSettings {
    pub preset: SwarmPreset,
    pub swarm: SwarmConfig,
    pub periods: Vec<usize>,
    pub normalization: Normalization,
    pub signal_mode: SignalMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelSettings {
    pub params: LabelParams,
    /// Forwarded to the external classifier; unused here.
    pub epochs: usize,
    pub predictions_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_path: String,
    pub backtest: BacktestConfig,
    pub split: TrainTestSplit,
    pub strategy: StrategySettings,
    pub swarm: SwarmSettings,
    pub labels: LabelSettings,
    pub output_dir: String,
}

/// Read and validate every section.
pub fn load_app_config(config: &dyn ConfigPort) -> Result<AppConfig, SwarmtraderError> {
    let backtest = validate_backtest_config(config)?;
    let mut labels = validate_label_config(config)?;
    labels.params.commission = backtest.execution.commission;
    Ok(AppConfig {
        data_path: validate_data_config(config)?,
        backtest,
        split: validate_split(config)?,
        strategy: validate_strategy_config(config)?,
        swarm: validate_swarm_config(config)?,
        labels,
        output_dir: config
            .get_string("report", "output_dir")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "output".to_string()),
    })
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<String, SwarmtraderError> {
    match config.get_string("data", "path") {
        Some(path) if !path.trim().is_empty() => Ok(path.trim().to_string()),
        Some(_) => Err(SwarmtraderError::invalid("data", "path", "path must not be empty")),
        None => Err(SwarmtraderError::missing("data", "path")),
    }
}

pub fn validate_backtest_config(
    config: &dyn ConfigPort,
) -> Result<BacktestConfig, SwarmtraderError> {
    let initial_cash = parse_or(config, "backtest", "initial_cash", DEFAULT_INITIAL_CASH)?;
    let commission = parse_or(config, "backtest", "commission", 0.0)?;
    let risk_free_rate: f64 = parse_or(config, "backtest", "risk_free_rate", 0.0)?;
    let fill = parse_or(config, "backtest", "fill", FillPrice::Close)?;

    if !(0.0..1.0).contains(&risk_free_rate) {
        return Err(SwarmtraderError::invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }

    let backtest = BacktestConfig {
        initial_cash,
        execution: ExecutionConfig { commission },
        fill,
        risk_free_rate,
    };
    backtest.validate()?;
    Ok(backtest)
}

/// Test window is required; the train window defaults to the two years
/// before it.
pub fn validate_split(config: &dyn ConfigPort) -> Result<TrainTestSplit, SwarmtraderError> {
    let test_start = required_date(config, "backtest", "test_start")?;
    let test_end = required_date(config, "backtest", "test_end")?;
    let train_start = optional_date(config, "backtest", "train_start")?;
    let train_end = optional_date(config, "backtest", "train_end")?;

    match (train_start, train_end) {
        (None, None) => TrainTestSplit::preceding_years(test_start, test_end, DEFAULT_TRAIN_YEARS),
        (start, end) => {
            let default =
                TrainTestSplit::preceding_years(test_start, test_end, DEFAULT_TRAIN_YEARS)?;
            TrainTestSplit::new(
                start.unwrap_or(default.train_start),
                end.unwrap_or(default.train_end),
                test_start,
                test_end,
            )
        }
    }
}

pub fn validate_strategy_config(
    config: &dyn ConfigPort,
) -> Result<StrategySettings, SwarmtraderError> {
    let one_ma_period: usize = parse_or(config, "strategy", "one_ma_period", 50)?;
    if one_ma_period < 2 {
        return Err(SwarmtraderError::invalid(
            "strategy",
            "one_ma_period",
            "one_ma_period must be at least 2",
        ));
    }

    let short: usize = parse_or(config, "strategy", "short_period", 10)?;
    let long: usize = parse_or(config, "strategy", "long_period", 50)?;
    if short == 0 || short >= long {
        return Err(SwarmtraderError::invalid(
            "strategy",
            "short_period",
            format!(
                "short_period ({}) must be positive and below long_period ({})",
                short, long
            ),
        ));
    }

    let defaults = ClassicParams::default();
    let classic = ClassicParams {
        rsi_period: parse_or(config, "strategy", "rsi_period", defaults.rsi_period)?,
        oversold: parse_or(config, "strategy", "rsi_oversold", defaults.oversold)?,
        overbought: parse_or(config, "strategy", "rsi_overbought", defaults.overbought)?,
    };
    if classic.rsi_period == 0 {
        return Err(SwarmtraderError::invalid(
            "strategy",
            "rsi_period",
            "rsi_period must be positive",
        ));
    }
    let levels_ordered = 0.0 <= classic.oversold
        && classic.oversold < classic.overbought
        && classic.overbought <= 100.0;
    if !levels_ordered {
        return Err(SwarmtraderError::invalid(
            "strategy",
            "rsi_oversold",
            "need 0 <= rsi_oversold < rsi_overbought <= 100",
        ));
    }

    Ok(StrategySettings {
        one_ma_period,
        cross: MovingAverageRule { short, long },
        classic,
    })
}

pub fn validate_swarm_config(config: &dyn ConfigPort) -> Result<SwarmSettings, SwarmtraderError> {
    let preset: SwarmPreset = parse_or(config, "swarm", "preset", SwarmPreset::Standard)?;
    let base = preset.config();
    let defaults = SwarmOptions::default();

    let swarm = SwarmConfig {
        n_particles: parse_or(config, "swarm", "n_particles", base.n_particles)?,
        iters: parse_or(config, "swarm", "iters", base.iters)?,
        options: SwarmOptions {
            c1: parse_or(config, "swarm", "c1", defaults.c1)?,
            c2: parse_or(config, "swarm", "c2", defaults.c2)?,
            w: parse_or(config, "swarm", "w", defaults.w)?,
        },
        seed: parse_or(config, "swarm", "seed", base.seed)?,
    };
    if swarm.n_particles == 0 {
        return Err(SwarmtraderError::invalid(
            "swarm",
            "n_particles",
            "n_particles must be positive",
        ));
    }
    if swarm.iters == 0 {
        return Err(SwarmtraderError::invalid("swarm", "iters", "iters must be positive"));
    }
    for (key, value) in [
        ("c1", swarm.options.c1),
        ("c2", swarm.options.c2),
        ("w", swarm.options.w),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(SwarmtraderError::invalid(
                "swarm",
                key,
                format!("{} must be a non-negative number", key),
            ));
        }
    }

    let periods = match config.get_list("swarm", "periods") {
        None => DEFAULT_PERIODS.to_vec(),
        Some(items) => items
            .iter()
            .map(|item| {
                item.parse::<usize>().ok().filter(|&p| p > 0).ok_or_else(|| {
                    SwarmtraderError::invalid(
                        "swarm",
                        "periods",
                        format!("'{}' is not a positive integer", item),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    let mut distinct = periods.clone();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < 2 {
        return Err(SwarmtraderError::invalid(
            "swarm",
            "periods",
            "need at least two distinct periods",
        ));
    }

    let normalization = parse_or(config, "swarm", "normalization", Normalization::Exponential)?;
    let signal_mode = match parse_or(config, "swarm", "signal_mode", SignalMode::Sign)? {
        SignalMode::Sign => SignalMode::Sign,
        SignalMode::Distance { scale } => {
            let scale: f64 = parse_or(config, "swarm", "distance_scale", scale)?;
            if !(scale.is_finite() && scale > 0.0) {
                return Err(SwarmtraderError::invalid(
                    "swarm",
                    "distance_scale",
                    "distance_scale must be positive",
                ));
            }
            SignalMode::Distance { scale }
        }
    };

    Ok(SwarmSettings {
        preset,
        swarm,
        periods,
        normalization,
        signal_mode,
    })
}

pub fn validate_label_config(
    config: &dyn ConfigPort,
) -> Result<LabelSettings, SwarmtraderError> {
    let defaults = LabelParams::default();
    let params = LabelParams {
        gain: parse_or(config, "labels", "gain", defaults.gain)?,
        loss: parse_or(config, "labels", "loss", defaults.loss)?,
        n_day: parse_or(config, "labels", "n_day", defaults.n_day)?,
        commission: 0.0,
    };
    params.validate()?;
    let epochs: usize = parse_or(config, "labels", "epochs", 100)?;
    if epochs == 0 {
        return Err(SwarmtraderError::invalid("labels", "epochs", "epochs must be positive"));
    }
    Ok(LabelSettings {
        params,
        epochs,
        predictions_path: config
            .get_string("labels", "predictions_path")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    })
}

/// Parse `[section] key`, or `default` when absent.
fn parse_or<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, SwarmtraderError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| {
            SwarmtraderError::invalid(section, key, format!("'{}': {}", raw.trim(), e))
        }),
    }
}

fn optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, SwarmtraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                SwarmtraderError::invalid(
                    section,
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
    }
}

fn required_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<NaiveDate, SwarmtraderError> {
    optional_date(config, section, key)?.ok_or_else(|| SwarmtraderError::missing(section, key))
}

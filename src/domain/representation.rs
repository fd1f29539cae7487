//! Candidate vectors for the swarm search.
//!
//! A candidate holds one raw weight per moving-average rule followed by the
//! buy and sell thresholds. [`decode`] turns it into strategy parameters and
//! [`SwarmRepresentation::cost_function`] scores a batch of candidates by
//! backtesting each one. Lower cost is better.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::backtest::{BacktestConfig, run_backtest};
use super::error::SwarmtraderError;
use super::ma_rules::{MovingAveragePanel, MovingAverageRule, SignalMode, build_catalog};
use super::price_series::PriceSeries;
use super::strategy::CombinedSignalStrategy;

/// How raw weights are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Softmax: non-negative, sums to 1.
    #[default]
    Exponential,
    /// Divide by the sum of absolute values.
    L1,
}

impl FromStr for Normalization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exponential" | "softmax" => Ok(Normalization::Exponential),
            "l1" => Ok(Normalization::L1),
            other => Err(format!(
                "unknown normalization '{}', expected exponential or l1",
                other
            )),
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalization::Exponential => f.write_str("exponential"),
            Normalization::L1 => f.write_str("l1"),
        }
    }
}

/// Strategy parameters decoded from a candidate vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedStrategyParams {
    pub weights: Vec<f64>,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
}

/// Split and normalize a candidate. Out-of-bound values are used as-is.
pub fn decode(
    vector: &[f64],
    normalization: Normalization,
) -> Result<DecodedStrategyParams, SwarmtraderError> {
    if vector.len() < 2 {
        return Err(SwarmtraderError::Candidate {
            reason: format!("need at least 2 components, got {}", vector.len()),
        });
    }
    let (raw, thresholds) = vector.split_at(vector.len() - 2);
    let weights = match normalization {
        Normalization::Exponential => softmax(raw),
        Normalization::L1 => l1_normalize(raw),
    };
    Ok(DecodedStrategyParams {
        weights,
        buy_threshold: thresholds[0],
        sell_threshold: thresholds[1],
    })
}

fn softmax(raw: &[f64]) -> Vec<f64> {
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = raw.iter().map(|&w| (w - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        vec![0.0; raw.len()]
    }
}

fn l1_normalize(raw: &[f64]) -> Vec<f64> {
    let sum: f64 = raw.iter().map(|w| w.abs()).sum();
    if sum > 0.0 && sum.is_finite() {
        raw.iter().map(|w| w / sum).collect()
    } else {
        vec![0.0; raw.len()]
    }
}

/// Per-dimension (lower, upper) bounds.
pub fn bounds(normalization: Normalization, rule_count: usize) -> (Vec<f64>, Vec<f64>) {
    let (weight_lo, weight_hi) = match normalization {
        Normalization::Exponential => (-1.0, 1.0),
        Normalization::L1 => (0.0, 1.0),
    };
    let mut lower = vec![weight_lo; rule_count];
    let mut upper = vec![weight_hi; rule_count];
    // buy threshold
    lower.push(0.0);
    upper.push(1.0);
    // sell threshold
    lower.push(-1.0);
    upper.push(0.0);
    (lower, upper)
}

/// Negative total return; zero when nothing was traded.
pub fn cost_from_values(initial: f64, final_value: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (initial - final_value) / initial
}

/// Everything needed to score candidates against one price history.
#[derive(Clone)]
pub struct SwarmRepresentation {
    series: PriceSeries,
    rules: Arc<[MovingAverageRule]>,
    panel: Arc<MovingAveragePanel>,
    normalization: Normalization,
    signal_mode: SignalMode,
    backtest: BacktestConfig,
}

impl SwarmRepresentation {
    pub fn new(
        series: PriceSeries,
        periods: &[usize],
        normalization: Normalization,
        signal_mode: SignalMode,
        backtest: BacktestConfig,
    ) -> Result<Self, SwarmtraderError> {
        let rules = build_catalog(periods);
        if rules.is_empty() {
            return Err(SwarmtraderError::invalid(
                "swarm",
                "periods",
                "need at least two distinct positive periods",
            ));
        }
        backtest.validate()?;
        let panel = Arc::new(MovingAveragePanel::for_rules(&series, &rules));
        Ok(Self {
            series,
            rules: Arc::from(rules),
            panel,
            normalization,
            signal_mode,
            backtest,
        })
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn backtest_config(&self) -> &BacktestConfig {
        &self.backtest
    }

    pub fn rules(&self) -> &[MovingAverageRule] {
        &self.rules
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Rules plus two thresholds.
    pub fn dimensions(&self) -> usize {
        self.rules.len() + 2
    }

    pub fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
        bounds(self.normalization, self.rules.len())
    }

    pub fn decode(&self, vector: &[f64]) -> Result<DecodedStrategyParams, SwarmtraderError> {
        decode(vector, self.normalization)
    }

    /// A fresh strategy for one candidate.
    pub fn build_strategy(
        &self,
        params: DecodedStrategyParams,
    ) -> Result<CombinedSignalStrategy, SwarmtraderError> {
        CombinedSignalStrategy::new(
            params,
            Arc::clone(&self.rules),
            Arc::clone(&self.panel),
            self.signal_mode,
        )
    }

    /// Backtest one candidate over `window` and return its cost.
    pub fn evaluate(&self, vector: &[f64], window: &PriceSeries) -> Result<f64, SwarmtraderError> {
        let params = self.decode(vector)?;
        let mut strategy = self.build_strategy(params)?;
        let result = run_backtest(window, &mut strategy, &self.backtest)?;
        Ok(cost_from_values(result.initial_value(), result.final_value()))
    }

    /// Cost of every candidate in `batch` over the bars dated `[from, to]`.
    pub fn cost_function(
        &self,
        batch: &[Vec<f64>],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<f64>, SwarmtraderError> {
        let window = self.series.range(from, to)?;

        #[cfg(feature = "parallel")]
        let costs: Result<Vec<f64>, SwarmtraderError> = batch
            .par_iter()
            .map(|candidate| self.evaluate(candidate, &window))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let costs: Result<Vec<f64>, SwarmtraderError> = batch
            .iter()
            .map(|candidate| self.evaluate(candidate, &window))
            .collect();

        costs
    }
}

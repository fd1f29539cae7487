//! Moving-average crossover rules and the precomputed average panel.
//!
//! The panel is computed once over the full price history so that warm-up
//! happens before any train or test window starts. Values at index `i` only
//! depend on bars `0..=i`.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::indicator::calculate_sma;
use super::price_series::PriceSeries;

/// Short/long window pair. Bullish when SMA(short) > SMA(long).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MovingAverageRule {
    pub short: usize,
    pub long: usize,
}

impl fmt::Display for MovingAverageRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SMA({})/SMA({})", self.short, self.long)
    }
}

/// Every (short, long) pair drawn from `periods`, short < long.
///
/// Periods are deduplicated and sorted; zero is dropped.
pub fn build_catalog(periods: &[usize]) -> Vec<MovingAverageRule> {
    let mut sorted: Vec<usize> = periods.iter().copied().filter(|&p| p > 0).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut rules = Vec::new();
    for (i, &short) in sorted.iter().enumerate() {
        for &long in &sorted[i + 1..] {
            rules.push(MovingAverageRule { short, long });
        }
    }
    rules
}

/// How a rule turns two averages into a signal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SignalMode {
    /// +1 above, -1 below, 0 when equal.
    #[default]
    Sign,
    /// (short - long) / long * scale, clamped to [-1, 1].
    Distance { scale: f64 },
}

impl FromStr for SignalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sign" => Ok(SignalMode::Sign),
            "distance" => Ok(SignalMode::Distance { scale: 10.0 }),
            other => Err(format!("unknown signal mode '{}', expected sign or distance", other)),
        }
    }
}

impl SignalMode {
    pub fn signal(&self, short: f64, long: f64) -> f64 {
        match self {
            SignalMode::Sign => {
                if short > long {
                    1.0
                } else if short < long {
                    -1.0
                } else {
                    0.0
                }
            }
            SignalMode::Distance { scale } => {
                if long == 0.0 {
                    return 0.0;
                }
                ((short - long) / long * scale).clamp(-1.0, 1.0)
            }
        }
    }
}

/// SMA values per period, aligned with the full series.
#[derive(Debug, Clone)]
pub struct MovingAveragePanel {
    dates: Vec<NaiveDate>,
    averages: BTreeMap<usize, Vec<Option<f64>>>,
}

impl MovingAveragePanel {
    pub fn compute(series: &PriceSeries, periods: &[usize]) -> Self {
        let closes = series.closes();
        let averages = periods
            .iter()
            .copied()
            .filter(|&p| p > 0)
            .map(|p| (p, calculate_sma(&closes, p)))
            .collect();
        Self {
            dates: series.dates(),
            averages,
        }
    }

    pub fn for_rules(series: &PriceSeries, rules: &[MovingAverageRule]) -> Self {
        let periods: Vec<usize> = rules.iter().flat_map(|r| [r.short, r.long]).collect();
        Self::compute(series, &periods)
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn average(&self, period: usize, index: usize) -> Option<f64> {
        self.averages.get(&period)?.get(index).copied().flatten()
    }

    /// Signal of one rule at `index`; 0 during warm-up.
    pub fn rule_signal(&self, rule: &MovingAverageRule, index: usize, mode: SignalMode) -> f64 {
        match (self.average(rule.short, index), self.average(rule.long, index)) {
            (Some(short), Some(long)) => mode.signal(short, long),
            _ => 0.0,
        }
    }
}

//! Technical indicators over closing-price slices.
//!
//! Every indicator returns one value per input element. Warm-up positions
//! hold `None`, so a series always lines up index-for-index with the prices
//! it was computed from.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use bollinger::calculate_bollinger_pct_b;
pub use ema::calculate_ema;
pub use macd::{MacdSeries, calculate_macd};
pub use roc::calculate_roc;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Roc(usize),
    Stddev(usize),
    MacdHistogram {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    BollingerPctB {
        period: usize,
        stddev_mult_x100: u32,
    },
}

/// A computed indicator aligned with its input.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn compute(kind: IndicatorKind, closes: &[f64]) -> Self {
        let values = match kind {
            IndicatorKind::Sma(period) => calculate_sma(closes, period),
            IndicatorKind::Ema(period) => calculate_ema(closes, period),
            IndicatorKind::Rsi(period) => calculate_rsi(closes, period),
            IndicatorKind::Roc(period) => calculate_roc(closes, period),
            IndicatorKind::Stddev(period) => calculate_stddev(closes, period),
            IndicatorKind::MacdHistogram { fast, slow, signal } => {
                calculate_macd(closes, fast, slow, signal).histogram
            }
            IndicatorKind::BollingerPctB {
                period,
                stddev_mult_x100,
            } => calculate_bollinger_pct_b(closes, period, stddev_mult_x100 as f64 / 100.0),
        };
        Self { kind, values }
    }

    pub fn at(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma(period) => write!(f, "SMA({})", period),
            IndicatorKind::Ema(period) => write!(f, "EMA({})", period),
            IndicatorKind::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorKind::Roc(period) => write!(f, "ROC({})", period),
            IndicatorKind::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorKind::MacdHistogram { fast, slow, signal } => {
                write!(f, "MACD_HIST({},{},{})", fast, slow, signal)
            }
            IndicatorKind::BollingerPctB {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER_PCT_B({},{})", period, mult)
            }
        }
    }
}

//! Bollinger %B.
//!
//! Middle = SMA(n), bands = middle +/- mult * population stddev.
//! %B = (C - lower) / (upper - lower), 0.5 when the bands collapse.

use super::sma::calculate_sma;
use super::stddev::calculate_stddev;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT: f64 = 2.0;

pub fn calculate_bollinger_pct_b(closes: &[f64], period: usize, mult: f64) -> Vec<Option<f64>> {
    let middle = calculate_sma(closes, period);
    let stddev = calculate_stddev(closes, period);

    closes
        .iter()
        .zip(middle.iter().zip(&stddev))
        .map(|(&close, (m, s))| {
            let (m, s) = ((*m)?, (*s)?);
            let upper = m + mult * s;
            let lower = m - mult * s;
            let width = upper - lower;
            if width > 0.0 {
                Some((close - lower) / width)
            } else {
                Some(0.5)
            }
        })
        .collect()
}

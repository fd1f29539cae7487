//! MACD (Moving Average Convergence Divergence).
//!
//! Line = EMA(fast) - EMA(slow), Signal = EMA(signal) of Line,
//! Histogram = Line - Signal. The signal EMA is seeded once the line itself
//! is valid, so the histogram warms up after slow - 1 + signal - 1 bars.

use super::ema::calculate_ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal_line = match line.iter().position(Option::is_some) {
        Some(first) => {
            let tail: Vec<f64> = line[first..].iter().map(|v| v.unwrap_or(0.0)).collect();
            let mut padded = vec![None; first];
            padded.extend(calculate_ema(&tail, signal));
            padded
        }
        None => vec![None; closes.len()],
    };

    let histogram = line
        .iter()
        .zip(&signal_line)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdSeries {
        line,
        signal: signal_line,
        histogram,
    }
}

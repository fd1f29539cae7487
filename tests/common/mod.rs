#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use swarmtrader::domain::ohlcv::PriceBar;
use swarmtrader::domain::price_series::PriceSeries;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64) -> PriceBar {
    PriceBar {
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1_000.0,
    }
}

/// One bar per calendar day from `start`.
pub fn series_from_closes(start: NaiveDate, closes: &[f64]) -> PriceSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start + Duration::days(i as i64), c))
        .collect();
    PriceSeries::new(bars).unwrap()
}

/// Slow upward drift with a 50-day cycle, so crossover rules fire regularly.
pub fn wave_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + 0.02 * t + 8.0 * (t * std::f64::consts::TAU / 50.0).sin()
        })
        .collect()
}

pub fn wave_series(start: NaiveDate, n: usize) -> PriceSeries {
    series_from_closes(start, &wave_closes(n))
}

/// Yahoo-style CSV with an `Adj Close` column.
pub fn write_price_csv(dir: &Path, series: &PriceSeries) -> PathBuf {
    let mut content = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for bar in series.bars() {
        content.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.close, bar.volume
        ));
    }
    let path = dir.join("prices.csv");
    fs::write(&path, content).unwrap();
    path
}

pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("run.ini");
    fs::write(&path, content).unwrap();
    path
}

/// Config over `wave_series(2020-01-01, 1100)`: train 2020-01-01..2021-12-31,
/// test 2022-01-01..2022-12-31, with a tiny swarm.
pub const RUN_INI: &str = r#"
[data]
path = prices.csv

[backtest]
initial_cash = 6000
commission = 0.001
test_start = 2022-01-01
test_end = 2022-12-31

[strategy]
one_ma_period = 20
short_period = 5
long_period = 20

[swarm]
n_particles = 6
iters = 4
seed = 7
periods = 5, 10, 20
normalization = l1

[labels]
gain = 0.03
loss = 0.02
n_day = 10

[report]
output_dir = out
"#;

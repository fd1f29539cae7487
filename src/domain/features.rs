//! Feature matrix and forward-looking labels for an external classifier.
//!
//! Features are computed from bars up to and including each date. Labels
//! look forward `n_day` bars and are therefore `None` at the end of the
//! series. Rows with any warm-up gap are dropped when partitioning.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::SwarmtraderError;
use super::indicator::{IndicatorKind, IndicatorSeries, bollinger, macd};
use super::price_series::{PriceSeries, TrainTestSplit};
use crate::ports::prediction_port::PredictionSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Rise,
    Fall,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Rise => "rise",
            Label::Fall => "fall",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    /// Accepts `rise`/`fall`, `up`/`down` and the classifier's `1`/`0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rise" | "up" | "1" => Ok(Label::Rise),
            "fall" | "down" | "0" | "-1" => Ok(Label::Fall),
            other => Err(format!("unknown label '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelParams {
    /// Target gain as a fraction, e.g. 0.03.
    pub gain: f64,
    /// Stop loss as a fraction, e.g. 0.02.
    pub loss: f64,
    /// Horizon in bars.
    pub n_day: usize,
    pub commission: f64,
}

impl Default for LabelParams {
    fn default() -> Self {
        LabelParams {
            gain: 0.03,
            loss: 0.02,
            n_day: 10,
            commission: 0.0,
        }
    }
}

impl LabelParams {
    pub fn validate(&self) -> Result<(), SwarmtraderError> {
        if !(self.gain.is_finite() && self.gain > 0.0) {
            return Err(SwarmtraderError::invalid("labels", "gain", "must be positive"));
        }
        if !(self.loss.is_finite() && self.loss > 0.0 && self.loss < 1.0) {
            return Err(SwarmtraderError::invalid("labels", "loss", "must be in (0, 1)"));
        }
        if self.n_day == 0 {
            return Err(SwarmtraderError::invalid("labels", "n_day", "must be positive"));
        }
        Ok(())
    }
}

/// `Rise` when the close reaches the round-trip-adjusted target within the
/// horizon before touching the stop; `Fall` otherwise.
pub fn build_labels(series: &PriceSeries, params: &LabelParams) -> Vec<Option<Label>> {
    let closes = series.closes();
    let n = closes.len();
    (0..n)
        .map(|i| {
            if params.n_day >= n - i {
                return None;
            }
            let entry = closes[i];
            let target = entry * (1.0 + params.gain + 2.0 * params.commission);
            let stop = entry * (1.0 - params.loss);
            for &future in &closes[i + 1..=i + params.n_day] {
                if future >= target {
                    return Some(Label::Rise);
                }
                if future <= stop {
                    return Some(Label::Fall);
                }
            }
            Some(Label::Fall)
        })
        .collect()
}

pub const FEATURE_COLUMNS: [&str; 12] = [
    "sma_ratio_5",
    "sma_ratio_10",
    "sma_ratio_20",
    "sma_ratio_50",
    "ema_ratio_12",
    "ema_ratio_26",
    "rsi_14",
    "macd_hist",
    "bollinger_pct_b",
    "roc_10",
    "volatility_20",
    "volume_change",
];

/// One column per feature, aligned with the series. `None` during warm-up.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<&'static str>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Complete row at `index`, or `None` if any column is missing.
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        self.values.iter().map(|col| col.get(index).copied().flatten()).collect()
    }
}

fn indicator(kind: IndicatorKind, values: &[f64]) -> Vec<Option<f64>> {
    IndicatorSeries::compute(kind, values).values
}

/// `close / indicator - 1` at each bar.
fn ratio_to(closes: &[f64], kind: IndicatorKind) -> Vec<Option<f64>> {
    closes
        .iter()
        .zip(indicator(kind, closes))
        .map(|(&c, r)| match r {
            Some(r) if r != 0.0 => Some(c / r - 1.0),
            _ => None,
        })
        .collect()
}

fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    for i in 1..values.len() {
        if values[i - 1] != 0.0 {
            out[i] = Some(values[i] / values[i - 1] - 1.0);
        }
    }
    out
}

/// Rolling stddev of daily returns.
fn volatility(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let returns: Vec<f64> = pct_change(closes)
        .into_iter()
        .skip(1)
        .map(|r| r.unwrap_or(0.0))
        .collect();
    let mut out = vec![None];
    out.extend(indicator(IndicatorKind::Stddev(period), &returns));
    out.truncate(closes.len());
    out
}

pub fn build_features(series: &PriceSeries) -> FeatureMatrix {
    let closes = series.closes();
    let volumes: Vec<f64> = series.bars().iter().map(|b| b.volume).collect();

    let macd_kind = IndicatorKind::MacdHistogram {
        fast: macd::DEFAULT_FAST,
        slow: macd::DEFAULT_SLOW,
        signal: macd::DEFAULT_SIGNAL,
    };
    // histogram in price units, scaled by the close
    let macd_hist: Vec<Option<f64>> = indicator(macd_kind, &closes)
        .into_iter()
        .zip(&closes)
        .map(|(h, &c)| h.filter(|_| c != 0.0).map(|h| h / c))
        .collect();
    let pct_b = IndicatorKind::BollingerPctB {
        period: bollinger::DEFAULT_PERIOD,
        stddev_mult_x100: (bollinger::DEFAULT_MULT * 100.0).round() as u32,
    };
    let percent = |kind| -> Vec<Option<f64>> {
        indicator(kind, &closes)
            .into_iter()
            .map(|v| v.map(|r| r / 100.0))
            .collect()
    };

    let values = vec![
        ratio_to(&closes, IndicatorKind::Sma(5)),
        ratio_to(&closes, IndicatorKind::Sma(10)),
        ratio_to(&closes, IndicatorKind::Sma(20)),
        ratio_to(&closes, IndicatorKind::Sma(50)),
        ratio_to(&closes, IndicatorKind::Ema(12)),
        ratio_to(&closes, IndicatorKind::Ema(26)),
        percent(IndicatorKind::Rsi(14)),
        macd_hist,
        indicator(pct_b, &closes),
        percent(IndicatorKind::Roc(10)),
        volatility(&closes, 20),
        pct_change(&volumes),
    ];

    FeatureMatrix {
        dates: series.dates(),
        columns: FEATURE_COLUMNS.to_vec(),
        values,
    }
}

/// Complete, labelled rows of one date window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<Label>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn rise_share(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|&&l| l == Label::Rise).count() as f64 / self.labels.len() as f64
    }
}

/// Train and test partitions by date; rows with gaps or no label are skipped.
pub fn split_by_date(
    matrix: &FeatureMatrix,
    labels: &[Option<Label>],
    split: &TrainTestSplit,
) -> Result<(Partition, Partition), SwarmtraderError> {
    if labels.len() != matrix.len() {
        return Err(SwarmtraderError::Data {
            reason: format!("{} labels for {} feature rows", labels.len(), matrix.len()),
        });
    }

    let mut train = Partition::default();
    let mut test = Partition::default();
    for (i, &date) in matrix.dates.iter().enumerate() {
        let target = if (split.train_start..=split.train_end).contains(&date) {
            &mut train
        } else if (split.test_start..=split.test_end).contains(&date) {
            &mut test
        } else {
            continue;
        };
        let (Some(row), Some(label)) = (matrix.row(i), labels[i]) else {
            continue;
        };
        target.dates.push(date);
        target.rows.push(row);
        target.labels.push(label);
    }

    if train.is_empty() {
        return Err(SwarmtraderError::DateRange {
            start: split.train_start,
            end: split.train_end,
            reason: "no complete labelled rows in train window".into(),
        });
    }
    Ok((train, test))
}

/// Z-score scaling fitted on one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl Standardizer {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, SwarmtraderError> {
        let Some(width) = rows.first().map(Vec::len) else {
            return Err(SwarmtraderError::Data {
                reason: "cannot fit standardizer on no rows".into(),
            });
        };
        let n = rows.len() as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v / n;
            }
        }
        let mut stds = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in stds.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2) / n;
            }
        }
        // constant columns scale by 1
        let stds = stds
            .into_iter()
            .map(|var| {
                let sd = var.sqrt();
                if sd > 1e-12 { sd } else { 1.0 }
            })
            .collect();
        Ok(Self { means, stds })
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(&self.means)
                    .zip(&self.stds)
                    .map(|((v, m), s)| (v - m) / s)
                    .collect()
            })
            .collect()
    }
}

/// Share of `partition` rows whose prediction matches the true label.
/// Dates without a prediction count as misses.
pub fn accuracy(source: &dyn PredictionSource, partition: &Partition) -> f64 {
    if partition.is_empty() {
        return 0.0;
    }
    let hits = partition
        .dates
        .iter()
        .zip(&partition.labels)
        .filter(|&(&date, &label)| source.predict(date) == Some(label))
        .count();
    hits as f64 / partition.len() as f64
}

/// Predictions equal to the true labels: the best any classifier could do.
#[derive(Debug, Clone, Default)]
pub struct LabelOracle {
    labels: BTreeMap<NaiveDate, Label>,
}

impl LabelOracle {
    pub fn new(series: &PriceSeries, labels: &[Option<Label>]) -> Self {
        let labels = series
            .dates()
            .into_iter()
            .zip(labels)
            .filter_map(|(d, l)| l.map(|l| (d, l)))
            .collect();
        Self { labels }
    }
}

impl PredictionSource for LabelOracle {
    fn predict(&self, date: NaiveDate) -> Option<Label> {
        self.labels.get(&date).copied()
    }

    fn name(&self) -> &str {
        "oracle"
    }
}

//! CSV report adapter implementing ReportPort.
//!
//! Files land in one output directory, named `<name>_<artifact>.csv`.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SwarmtraderError;
use crate::domain::features::Partition;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn writer(
        &self,
        name: &str,
        artifact: &str,
    ) -> Result<(csv::Writer<fs::File>, PathBuf), SwarmtraderError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}_{}.csv", sanitize(name), artifact));
        let writer = csv::Writer::from_path(&path)?;
        debug!(path = %path.display(), "writing report");
        Ok((writer, path))
    }
}

/// File-name-safe version of a strategy name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[derive(Serialize)]
struct EquityRow {
    date: NaiveDate,
    value: f64,
}

#[derive(Serialize)]
struct TradeRow {
    entry_date: NaiveDate,
    exit_date: NaiveDate,
    quantity: f64,
    entry_price: f64,
    exit_price: f64,
    pnl: f64,
    return_pct: f64,
    duration_days: i64,
}

#[derive(Serialize)]
struct MetricRow<'a> {
    metric: &'a str,
    value: f64,
}

#[derive(Serialize)]
struct HistoryRow {
    iteration: usize,
    best_cost: f64,
}

impl ReportPort for CsvReportAdapter {
    fn write_equity_curve(
        &self,
        result: &BacktestResult,
        name: &str,
    ) -> Result<PathBuf, SwarmtraderError> {
        let (mut wtr, path) = self.writer(name, "equity")?;
        for (date, value) in result.equity_series() {
            wtr.serialize(EquityRow { date, value })?;
        }
        wtr.flush()?;
        Ok(path)
    }

    fn write_trades(
        &self,
        result: &BacktestResult,
        name: &str,
    ) -> Result<PathBuf, SwarmtraderError> {
        let (mut wtr, path) = self.writer(name, "trades")?;
        if result.portfolio.closed_trades.is_empty() {
            wtr.write_record([
                "entry_date",
                "exit_date",
                "quantity",
                "entry_price",
                "exit_price",
                "pnl",
                "return_pct",
                "duration_days",
            ])?;
        }
        for trade in &result.portfolio.closed_trades {
            wtr.serialize(TradeRow {
                entry_date: trade.entry_date,
                exit_date: trade.exit_date,
                quantity: trade.quantity,
                entry_price: trade.entry_price,
                exit_price: trade.exit_price,
                pnl: trade.pnl,
                return_pct: trade.return_pct(),
                duration_days: trade.duration_days(),
            })?;
        }
        wtr.flush()?;
        Ok(path)
    }

    fn write_metrics(
        &self,
        result: &BacktestResult,
        name: &str,
    ) -> Result<PathBuf, SwarmtraderError> {
        let (mut wtr, path) = self.writer(name, "metrics")?;
        for (metric, value) in result.metrics.named() {
            wtr.serialize(MetricRow { metric, value })?;
        }
        wtr.flush()?;
        Ok(path)
    }

    fn write_cost_history(&self, history: &[f64], name: &str) -> Result<PathBuf, SwarmtraderError> {
        let (mut wtr, path) = self.writer(name, "history")?;
        for (iteration, &best_cost) in history.iter().enumerate() {
            wtr.serialize(HistoryRow {
                iteration: iteration + 1,
                best_cost,
            })?;
        }
        wtr.flush()?;
        Ok(path)
    }

    fn write_dataset(
        &self,
        columns: &[&str],
        partition: &Partition,
        name: &str,
    ) -> Result<PathBuf, SwarmtraderError> {
        let (mut wtr, path) = self.writer(name, "dataset")?;
        let mut header = vec!["date"];
        header.extend_from_slice(columns);
        header.push("label");
        wtr.write_record(&header)?;

        let rows = partition.dates.iter().zip(&partition.rows).zip(&partition.labels);
        for ((date, row), label) in rows {
            if row.len() != columns.len() {
                return Err(SwarmtraderError::Data {
                    reason: format!(
                        "row on {} has {} values for {} columns",
                        date,
                        row.len(),
                        columns.len()
                    ),
                });
            }
            let mut record = Vec::with_capacity(row.len() + 2);
            record.push(date.to_string());
            record.extend(row.iter().map(|v| v.to_string()));
            record.push(label.to_string());
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(path)
    }
}

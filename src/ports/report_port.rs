//! Report generation port trait.

use std::path::PathBuf;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SwarmtraderError;
use crate::domain::features::Partition;

/// Port for writing run artifacts. Each method returns the path it wrote.
pub trait ReportPort {
    /// Equity curve as `(date, value)` rows.
    fn write_equity_curve(
        &self,
        result: &BacktestResult,
        name: &str,
    ) -> Result<PathBuf, SwarmtraderError>;

    fn write_trades(
        &self,
        result: &BacktestResult,
        name: &str,
    ) -> Result<PathBuf, SwarmtraderError>;

    fn write_metrics(
        &self,
        result: &BacktestResult,
        name: &str,
    ) -> Result<PathBuf, SwarmtraderError>;

    /// Best cost after each swarm iteration.
    fn write_cost_history(&self, history: &[f64], name: &str) -> Result<PathBuf, SwarmtraderError>;

    /// Standardized feature rows plus labels, for the external classifier.
    fn write_dataset(
        &self,
        columns: &[&str],
        partition: &Partition,
        name: &str,
    ) -> Result<PathBuf, SwarmtraderError>;

    /// Equity curve, trades and metrics in one call.
    fn write(&self, result: &BacktestResult, name: &str) -> Result<Vec<PathBuf>, SwarmtraderError> {
        Ok(vec![
            self.write_equity_curve(result, name)?,
            self.write_trades(result, name)?,
            self.write_metrics(result, name)?,
        ])
    }
}

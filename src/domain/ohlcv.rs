//! Daily price bar.

use chrono::NaiveDate;

/// One trading day of OHLCV data. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

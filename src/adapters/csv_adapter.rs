//! CSV file price adapter.
//!
//! Columns are located by header name, case-insensitively, so files with
//! extra columns such as `Adj Close` load unchanged. Rows carrying `null` or
//! empty prices are skipped.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::error::SwarmtraderError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::price_series::PriceSeries;
use crate::ports::data_port::PriceDataPort;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PriceDataPort for CsvAdapter {
    fn load_prices(&self) -> Result<PriceSeries, SwarmtraderError> {
        let file = File::open(&self.path).map_err(|e| SwarmtraderError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let series = parse_prices(file)?;
        info!(
            path = %self.path.display(),
            bars = series.len(),
            from = %series.first_date(),
            to = %series.last_date(),
            "loaded prices"
        );
        Ok(series)
    }

    fn source(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: String,
    open: Option<String>,
    high: Option<String>,
    low: Option<String>,
    close: Option<String>,
    #[serde(default)]
    volume: Option<String>,
}

/// `Ok(None)` for a null cell, an error for anything else unparsable.
fn parse_cell(
    raw: Option<&str>,
    column: &str,
    date: NaiveDate,
) -> Result<Option<f64>, SwarmtraderError> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| SwarmtraderError::Data {
            reason: format!("invalid {} value '{}' on {}: {}", column, raw, date, e),
        })
}

/// Prices must be finite and strictly positive.
fn parse_price(
    raw: Option<&str>,
    column: &str,
    date: NaiveDate,
) -> Result<Option<f64>, SwarmtraderError> {
    match parse_cell(raw, column, date)? {
        Some(price) if !(price.is_finite() && price > 0.0) => Err(SwarmtraderError::Data {
            reason: format!("{} must be a positive number on {}, got {}", column, date, price),
        }),
        price => Ok(price),
    }
}

fn parse_volume(raw: Option<&str>, date: NaiveDate) -> Result<f64, SwarmtraderError> {
    match parse_cell(raw, "volume", date)? {
        Some(volume) if !(volume.is_finite() && volume >= 0.0) => Err(SwarmtraderError::Data {
            reason: format!("volume must be non-negative on {}, got {}", date, volume),
        }),
        volume => Ok(volume.unwrap_or(0.0)),
    }
}

/// Read a daily price CSV into a validated series.
pub fn parse_prices<R: Read>(reader: R) -> Result<PriceSeries, SwarmtraderError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers: csv::StringRecord = rdr.headers()?.iter().map(|h| h.to_lowercase()).collect();
    for required in ["date", "open", "high", "low", "close"] {
        if !headers.iter().any(|h| h == required) {
            return Err(SwarmtraderError::Data {
                reason: format!("missing {} column", required),
            });
        }
    }
    rdr.set_headers(headers.clone());

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result?;
        let row: PriceRow = record.deserialize(Some(&headers))?;

        let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").map_err(|e| {
            SwarmtraderError::Data {
                reason: format!("invalid date '{}': {}", row.date, e),
            }
        })?;

        let open = parse_price(row.open.as_deref(), "open", date)?;
        let high = parse_price(row.high.as_deref(), "high", date)?;
        let low = parse_price(row.low.as_deref(), "low", date)?;
        let close = parse_price(row.close.as_deref(), "close", date)?;
        let (Some(open), Some(high), Some(low), Some(close)) = (open, high, low, close) else {
            debug!(%date, "skipping row with missing prices");
            skipped += 1;
            continue;
        };
        let volume = parse_volume(row.volume.as_deref(), date)?;

        bars.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    if skipped > 0 {
        debug!(skipped, "rows without prices skipped");
    }
    if bars.is_empty() {
        return Err(SwarmtraderError::EmptySeries);
    }
    PriceSeries::from_unsorted(bars)
}

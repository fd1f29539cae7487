//! Date-indexed price history and train/test windows.
//!
//! A [`PriceSeries`] is sorted ascending by date with no duplicates. Range
//! queries return new series; the source is never mutated. Missing business
//! days are tolerated.

use chrono::{Datelike, Days, NaiveDate};
use std::collections::HashMap;
use std::sync::Arc;

use super::error::SwarmtraderError;
use super::ohlcv::PriceBar;

#[derive(Debug, Clone)]
pub struct PriceSeries {
    bars: Arc<[PriceBar]>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    /// Build a series, rejecting empty, unsorted or duplicated input.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, SwarmtraderError> {
        if bars.is_empty() {
            return Err(SwarmtraderError::EmptySeries);
        }
        for pair in bars.windows(2) {
            if pair[1].date == pair[0].date {
                return Err(SwarmtraderError::UnorderedSeries {
                    date: pair[1].date,
                    reason: "duplicate date".into(),
                });
            }
            if pair[1].date < pair[0].date {
                return Err(SwarmtraderError::UnorderedSeries {
                    date: pair[1].date,
                    reason: format!("follows later date {}", pair[0].date),
                });
            }
        }
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Ok(Self {
            bars: bars.into(),
            date_index,
        })
    }

    /// Sort by date first, then build. Duplicates still fail.
    pub fn from_unsorted(mut bars: Vec<PriceBar>) -> Result<Self, SwarmtraderError> {
        bars.sort_by_key(|b| b.date);
        Self::new(bars)
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Inclusive `[start, end]` slice. Fails on an inverted or empty range.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries, SwarmtraderError> {
        if start > end {
            return Err(SwarmtraderError::DateRange {
                start,
                end,
                reason: "start date is after end date".into(),
            });
        }
        let lo = self.bars.partition_point(|b| b.date < start);
        let hi = self.bars.partition_point(|b| b.date <= end);
        if lo >= hi {
            return Err(SwarmtraderError::DateRange {
                start,
                end,
                reason: "no bars in range".into(),
            });
        }
        PriceSeries::new(self.bars[lo..hi].to_vec())
    }
}

/// Train and test date windows. Train strictly precedes test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train_start: NaiveDate,
    pub train_end: NaiveDate,
    pub test_start: NaiveDate,
    pub test_end: NaiveDate,
}

impl TrainTestSplit {
    pub fn new(
        train_start: NaiveDate,
        train_end: NaiveDate,
        test_start: NaiveDate,
        test_end: NaiveDate,
    ) -> Result<Self, SwarmtraderError> {
        if train_start > train_end {
            return Err(SwarmtraderError::DateRange {
                start: train_start,
                end: train_end,
                reason: "train start is after train end".into(),
            });
        }
        if test_start > test_end {
            return Err(SwarmtraderError::DateRange {
                start: test_start,
                end: test_end,
                reason: "test start is after test end".into(),
            });
        }
        if test_start <= train_end {
            return Err(SwarmtraderError::DateRange {
                start: train_end,
                end: test_start,
                reason: "test start must be after train end".into(),
            });
        }
        Ok(Self {
            train_start,
            train_end,
            test_start,
            test_end,
        })
    }

    /// Two years of training data ending the day before the test window.
    pub fn preceding_years(
        test_start: NaiveDate,
        test_end: NaiveDate,
        years: i32,
    ) -> Result<Self, SwarmtraderError> {
        let train_start = shift_years(test_start, -years);
        let train_end = test_start
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| SwarmtraderError::DateRange {
                start: test_start,
                end: test_end,
                reason: "test start has no preceding day".into(),
            })?;
        Self::new(train_start, train_end, test_start, test_end)
    }

    pub fn train(&self, series: &PriceSeries) -> Result<PriceSeries, SwarmtraderError> {
        series.range(self.train_start, self.train_end)
    }

    pub fn test(&self, series: &PriceSeries) -> Result<PriceSeries, SwarmtraderError> {
        series.range(self.test_start, self.test_end)
    }
}

/// Same month/day `years` away; Feb 29 falls back to Feb 28.
fn shift_years(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year() + years;
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}

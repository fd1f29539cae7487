//! RSI mean-reversion rule.
//!
//! Buy when RSI crosses up through the oversold level while flat; sell when
//! it crosses down through the overbought level while long.

use chrono::NaiveDate;

use super::{Decision, MarketView, Strategy, cross_decision, crossed_above, crossed_below};
use crate::domain::error::SwarmtraderError;
use crate::domain::indicator::{IndicatorKind, IndicatorSeries};
use crate::domain::price_series::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassicParams {
    pub rsi_period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for ClassicParams {
    fn default() -> Self {
        ClassicParams {
            rsi_period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

pub struct ClassicStrategy {
    params: ClassicParams,
    dates: Vec<NaiveDate>,
    rsi: IndicatorSeries,
}

impl ClassicStrategy {
    pub fn new(history: &PriceSeries, params: ClassicParams) -> Result<Self, SwarmtraderError> {
        if params.rsi_period == 0 {
            return Err(SwarmtraderError::invalid(
                "strategy",
                "rsi_period",
                "must be positive",
            ));
        }
        if !(0.0..=100.0).contains(&params.oversold)
            || !(0.0..=100.0).contains(&params.overbought)
            || params.oversold >= params.overbought
        {
            return Err(SwarmtraderError::invalid(
                "strategy",
                "rsi_oversold",
                format!(
                    "need 0 <= oversold ({}) < overbought ({}) <= 100",
                    params.oversold, params.overbought
                ),
            ));
        }

        let rsi =
            IndicatorSeries::compute(IndicatorKind::Rsi(params.rsi_period), &history.closes());
        Ok(Self {
            params,
            dates: history.dates(),
            rsi,
        })
    }

    fn rsi_pair(&self, date: NaiveDate) -> Option<(f64, f64)> {
        let index = self.dates.binary_search(&date).ok()?;
        let prev = self.rsi.at(index.checked_sub(1)?)?;
        let curr = self.rsi.at(index)?;
        Some((prev, curr))
    }
}

impl Strategy for ClassicStrategy {
    fn name(&self) -> &str {
        "classic rsi"
    }

    fn decide(&mut self, view: &MarketView<'_>) -> Decision {
        let Some((prev, curr)) = self.rsi_pair(view.date()) else {
            return Decision::Hold;
        };
        let oversold = self.params.oversold;
        let overbought = self.params.overbought;
        cross_decision(
            crossed_above((prev, oversold), (curr, oversold)),
            crossed_below((prev, overbought), (curr, overbought)),
            view.has_position,
        )
    }
}

//! Close versus a single simple moving average.

use std::sync::Arc;

use super::{Decision, MarketView, Strategy, cross_decision, crossed_above, crossed_below};
use crate::domain::error::SwarmtraderError;
use crate::domain::ma_rules::MovingAveragePanel;
use crate::domain::price_series::PriceSeries;

pub struct OneMovingAverageStrategy {
    period: usize,
    closes: Vec<f64>,
    panel: Arc<MovingAveragePanel>,
    name: String,
}

impl OneMovingAverageStrategy {
    pub fn new(history: &PriceSeries, period: usize) -> Result<Self, SwarmtraderError> {
        if period < 2 {
            return Err(SwarmtraderError::invalid(
                "strategy",
                "one_ma_period",
                "must be at least 2",
            ));
        }
        Ok(Self {
            period,
            closes: history.closes(),
            panel: Arc::new(MovingAveragePanel::compute(history, &[period])),
            name: format!("close/SMA({})", period),
        })
    }

    /// (close, sma) at `index`, if warm.
    fn pair(&self, index: usize) -> Option<(f64, f64)> {
        let close = *self.closes.get(index)?;
        let sma = self.panel.average(self.period, index)?;
        Some((close, sma))
    }
}

impl Strategy for OneMovingAverageStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, view: &MarketView<'_>) -> Decision {
        let Some(index) = self.panel.index_of(view.date()) else {
            return Decision::Hold;
        };
        let prev = index.checked_sub(1).and_then(|i| self.pair(i));
        let (Some(prev), Some(curr)) = (prev, self.pair(index)) else {
            return Decision::Hold;
        };
        cross_decision(
            crossed_above(prev, curr),
            crossed_below(prev, curr),
            view.has_position,
        )
    }
}

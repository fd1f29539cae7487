//! Two simple moving averages crossing.

use std::sync::Arc;

use super::{Decision, MarketView, Strategy, cross_decision, crossed_above, crossed_below};
use crate::domain::error::SwarmtraderError;
use crate::domain::ma_rules::{MovingAveragePanel, MovingAverageRule};
use crate::domain::price_series::PriceSeries;

pub struct MovingAverageCrossStrategy {
    rule: MovingAverageRule,
    panel: Arc<MovingAveragePanel>,
    name: String,
}

impl MovingAverageCrossStrategy {
    pub fn new(history: &PriceSeries, rule: MovingAverageRule) -> Result<Self, SwarmtraderError> {
        let panel = Arc::new(MovingAveragePanel::for_rules(history, &[rule]));
        Self::with_panel(rule, panel)
    }

    /// Reuse a panel that already holds both periods of `rule`.
    pub fn with_panel(
        rule: MovingAverageRule,
        panel: Arc<MovingAveragePanel>,
    ) -> Result<Self, SwarmtraderError> {
        if rule.short == 0 || rule.short >= rule.long {
            return Err(SwarmtraderError::invalid(
                "strategy",
                "short_period",
                format!("need 0 < short ({}) < long ({})", rule.short, rule.long),
            ));
        }
        Ok(Self {
            name: rule.to_string(),
            rule,
            panel,
        })
    }

    fn pair(&self, index: usize) -> Option<(f64, f64)> {
        Some((
            self.panel.average(self.rule.short, index)?,
            self.panel.average(self.rule.long, index)?,
        ))
    }
}

impl Strategy for MovingAverageCrossStrategy {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PriceBar;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: c,
                    high: c,
                    low: c,
                    close: c,
                    volume: 0.0,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_inverted_rule() {
        let s = series(&[1.0, 2.0, 3.0]);
        let inverted = MovingAverageRule { short: 5, long: 3 };
        assert!(MovingAverageCrossStrategy::new(&s, inverted).is_err());
    }

    #[test]
    fn golden_and_death_cross() {
        let s = series(&[5.0, 4.0, 3.0, 2.0, 6.0, 8.0, 9.0, 1.0, 1.0, 1.0]);
        let rule = MovingAverageRule { short: 2, long: 4 };
        let mut strategy = MovingAverageCrossStrategy::new(&s, rule).unwrap();
        let bars = s.bars();
        let mut has_position = false;
        let mut decisions = Vec::new();
        for i in 0..bars.len() {
            let view = MarketView {
                history: &bars[..=i],
                current: &bars[i],
                has_position,
            };
            let d = strategy.decide(&view);
            match d {
                Decision::Buy => has_position = true,
                Decision::Sell => has_position = false,
                Decision::Hold => {}
            }
            decisions.push(d);
        }
        // i=4: SMA2 4.0 vs SMA4 3.75 (prev 2.5 vs 3.5)
        assert_eq!(decisions[4], Decision::Buy);
        // i=7: SMA2 5.0 vs SMA4 6.0 (prev 8.5 vs 6.25)
        let sell_at = decisions.iter().position(|&d| d == Decision::Sell).unwrap();
        assert_eq!(sell_at, 7);
    }
}

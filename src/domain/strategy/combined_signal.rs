//! Weighted vote of moving-average crossover rules.
//!
//! The aggregate signal is the dot product of the rule weights with the
//! per-rule signals on the current bar. Buy at or above the buy threshold
//! while flat, sell at or below the sell threshold while long.

use std::sync::Arc;

use super::{Decision, MarketView, Strategy};
use crate::domain::error::SwarmtraderError;
use crate::domain::ma_rules::{MovingAveragePanel, MovingAverageRule, SignalMode};
use crate::domain::representation::DecodedStrategyParams;

pub struct CombinedSignalStrategy {
    params: DecodedStrategyParams,
    rules: Arc<[MovingAverageRule]>,
    panel: Arc<MovingAveragePanel>,
    mode: SignalMode,
    signals: Vec<f64>,
}

impl CombinedSignalStrategy {
    pub fn new(
        params: DecodedStrategyParams,
        rules: Arc<[MovingAverageRule]>,
        panel: Arc<MovingAveragePanel>,
        mode: SignalMode,
    ) -> Result<Self, SwarmtraderError> {
        if params.weights.len() != rules.len() {
            return Err(SwarmtraderError::Candidate {
                reason: format!(
                    "{} weights for {} rules",
                    params.weights.len(),
                    rules.len()
                ),
            });
        }
        let signals = Vec::with_capacity(rules.len());
        Ok(Self {
            params,
            rules,
            panel,
            mode,
            signals,
        })
    }

    pub fn params(&self) -> &DecodedStrategyParams {
        &self.params
    }

    /// Aggregate signal on the view's bar; zero when the date is unknown.
    pub fn aggregate(&mut self, view: &MarketView<'_>) -> f64 {
        let Some(index) = self.panel.index_of(view.date()) else {
            return 0.0;
        };
        let panel = &self.panel;
        let mode = self.mode;
        self.signals.clear();
        self.signals.extend(
            self.rules
                .iter()
                .map(|rule| panel.rule_signal(rule, index, mode)),
        );
        combine(&self.params.weights, &self.signals)
    }
}

/// dot(weights, signals)
pub fn combine(weights: &[f64], signals: &[f64]) -> f64 {
    weights.iter().zip(signals).map(|(w, s)| w * s).sum()
}

/// Threshold policy. Both comparisons are inclusive.
pub fn threshold_decision(
    aggregate: f64,
    params: &DecodedStrategyParams,
    has_position: bool,
) -> Decision {
    if !has_position && aggregate >= params.buy_threshold {
        Decision::Buy
    } else if has_position && aggregate <= params.sell_threshold {
        Decision::Sell
    } else {
        Decision::Hold
    }
}

impl Strategy for CombinedSignalStrategy {
    fn name(&self) -> &str {
        "combined signal"
    }

    fn decide(&mut self, view: &MarketView<'_>) -> Decision {
        let aggregate = self.aggregate(view);
        threshold_decision(aggregate, &self.params, view.has_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{BacktestConfig, Side, run_backtest};
    use crate::domain::ohlcv::PriceBar;
    use crate::domain::price_series::PriceSeries;
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

    fn params(weights: Vec<f64>, buy: f64, sell: f64) -> DecodedStrategyParams {
        DecodedStrategyParams {
            weights,
            buy_threshold: buy,
            sell_threshold: sell,
        }
    }

    #[test]
    fn buy_threshold_is_inclusive() {
        let p = params(vec![0.5, 0.5], 0.5, -0.5);
        let aggregate = combine(&p.weights, &[1.0, 0.0]);
        assert_eq!(aggregate, 0.5);
        assert_eq!(threshold_decision(aggregate, &p, false), Decision::Buy);
    }

    #[test]
    fn sell_threshold_is_inclusive() {
        let p = params(vec![0.5, 0.5], 0.5, -0.5);
        assert_eq!(threshold_decision(-0.5, &p, true), Decision::Sell);
        assert_eq!(threshold_decision(-0.4, &p, true), Decision::Hold);
    }

    #[test]
    fn zero_signal_with_zero_threshold_buys_when_flat() {
        let p = params(vec![0.0, 0.0], 0.0, -0.1);
        assert_eq!(threshold_decision(0.0, &p, false), Decision::Buy);
        assert_eq!(threshold_decision(0.0, &p, true), Decision::Hold);
    }

    #[test]
    fn position_gates_each_side() {
        let p = params(vec![1.0], 0.2, -0.2);
        assert_eq!(threshold_decision(0.9, &p, true), Decision::Hold);
        assert_eq!(threshold_decision(-0.9, &p, false), Decision::Hold);
    }

    #[test]
    fn backtest_buys_on_the_bar_that_meets_the_threshold() {
        let closes: Vec<f64> = (0..15).map(|i| 10.0 + i as f64).collect();
        let s = series(&closes);
        let rules: Arc<[MovingAverageRule]> = Arc::from(vec![
            MovingAverageRule { short: 2, long: 3 },
            MovingAverageRule { short: 2, long: 10 },
        ]);
        let panel = Arc::new(MovingAveragePanel::for_rules(&s, &rules));
        let mut strategy = CombinedSignalStrategy::new(
            params(vec![0.5, 0.5], 0.5, -1.0),
            rules,
            panel,
            SignalMode::Sign,
        )
        .unwrap();

        // bar 2: first rule bullish, second still warming, aggregate exactly 0.5
        let view = MarketView {
            history: &s.bars()[..=2],
            current: &s.bars()[2],
            has_position: false,
        };
        assert_eq!(strategy.aggregate(&view), 0.5);

        let result = run_backtest(&s, &mut strategy, &BacktestConfig::default()).unwrap();
        assert_eq!(result.buys(), 1);
        assert_eq!(result.orders[0].side, Side::Buy);
        assert_eq!(result.orders[0].date, s.bars()[2].date);
        assert_eq!(result.orders[0].price, 12.0);
    }

    #[test]
    fn weight_count_must_match_rules() {
        let s = series(&[1.0]);
        let rules: Arc<[MovingAverageRule]> =
            Arc::from(vec![MovingAverageRule { short: 2, long: 3 }]);
        let panel = Arc::new(MovingAveragePanel::for_rules(&s, &rules));
        let result = CombinedSignalStrategy::new(
            params(vec![0.5, 0.5], 0.5, -0.5),
            rules,
            panel,
            SignalMode::Sign,
        );
        assert!(matches!(result, Err(SwarmtraderError::Candidate { .. })));
    }
}

//! Trading strategies evaluated bar by bar by the backtest runner.
//!
//! A strategy sees the bars up to and including the current one and returns a
//! [`Decision`]. Indicator-based strategies precompute their series over the
//! full price history and look values up by date, so no future bar is ever
//! read.

pub mod buy_and_hold;
pub mod classic;
pub mod combined_signal;
pub mod moving_average_cross;
pub mod one_moving_average;
pub mod prediction;

pub use buy_and_hold::BuyAndHoldStrategy;
pub use classic::{ClassicParams, ClassicStrategy};
pub use combined_signal::CombinedSignalStrategy;
pub use moving_average_cross::MovingAverageCrossStrategy;
pub use one_moving_average::OneMovingAverageStrategy;
pub use prediction::PredictionStrategy;

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use super::ohlcv::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

/// What a strategy may observe on one bar.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    /// Bars of the run so far, current bar last.
    pub history: &'a [PriceBar],
    pub current: &'a PriceBar,
    pub has_position: bool,
}

impl MarketView<'_> {
    pub fn date(&self) -> NaiveDate {
        self.current.date
    }

    /// Zero-based position of the current bar within the run.
    pub fn index(&self) -> usize {
        self.history.len().saturating_sub(1)
    }
}

pub trait Strategy: Send {
    fn name(&self) -> &str;

    fn decide(&mut self, view: &MarketView<'_>) -> Decision;
}

/// Strategy selector for the command line and config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    BuyAndHold,
    Classic,
    OneMovingAverage,
    MovingAverageCross,
    Prediction,
    Swarm,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::BuyAndHold,
        StrategyKind::Classic,
        StrategyKind::OneMovingAverage,
        StrategyKind::MovingAverageCross,
        StrategyKind::Prediction,
        StrategyKind::Swarm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::BuyAndHold => "hold",
            StrategyKind::Classic => "classic",
            StrategyKind::OneMovingAverage => "one-ma",
            StrategyKind::MovingAverageCross => "ma-cross",
            StrategyKind::Prediction => "prediction",
            StrategyKind::Swarm => "pso",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = StrategyKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown strategy '{}', expected one of {}", s, names.join(", "))
            })
    }
}

/// Buy on a bullish cross while flat, sell on a bearish cross while long.
pub(crate) fn cross_decision(
    bullish_cross: bool,
    bearish_cross: bool,
    has_position: bool,
) -> Decision {
    if bullish_cross && !has_position {
        Decision::Buy
    } else if bearish_cross && has_position {
        Decision::Sell
    } else {
        Decision::Hold
    }
}

/// `left` moved from at-or-below `right` to strictly above it.
pub(crate) fn crossed_above(prev: (f64, f64), curr: (f64, f64)) -> bool {
    prev.0 <= prev.1 && curr.0 > curr.1
}

/// `left` moved from at-or-above `right` to strictly below it.
pub(crate) fn crossed_below(prev: (f64, f64), curr: (f64, f64)) -> bool {
    prev.0 >= prev.1 && curr.0 < curr.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_kind_round_trips_through_str() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>(), Ok(kind));
        }
        assert_eq!("  PSO ".parse::<StrategyKind>(), Ok(StrategyKind::Swarm));
        assert!("martingale".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn cross_detection() {
        assert!(crossed_above((1.0, 2.0), (3.0, 2.0)));
        assert!(crossed_above((2.0, 2.0), (3.0, 2.0)));
        assert!(!crossed_above((3.0, 2.0), (4.0, 2.0)));
        assert!(crossed_below((3.0, 2.0), (1.0, 2.0)));
        assert!(!crossed_below((1.0, 2.0), (0.5, 2.0)));
    }

    #[test]
    fn cross_decision_respects_position() {
        assert_eq!(cross_decision(true, false, false), Decision::Buy);
        assert_eq!(cross_decision(true, false, true), Decision::Hold);
        assert_eq!(cross_decision(false, true, true), Decision::Sell);
        assert_eq!(cross_decision(false, true, false), Decision::Hold);
        assert_eq!(cross_decision(false, false, false), Decision::Hold);
    }

    #[test]
    fn market_view_index() {
        let bar = PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
        };
        let bars = vec![bar.clone(), bar.clone(), bar];
        let view = MarketView {
            history: &bars,
            current: &bars[2],
            has_position: false,
        };
        assert_eq!(view.index(), 2);
        assert_eq!(view.date(), bars[2].date);
    }
}

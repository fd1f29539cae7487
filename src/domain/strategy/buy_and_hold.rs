//! Baseline: all cash into the instrument on the first bar, never sell.

use super::{Decision, MarketView, Strategy};

#[derive(Debug, Clone, Default)]
pub struct BuyAndHoldStrategy {
    ordered: bool,
}

impl BuyAndHoldStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for BuyAndHoldStrategy {
    fn name(&self) -> &str {
        "buy and hold"
    }

    fn decide(&mut self, view: &MarketView<'_>) -> Decision {
        if self.ordered || view.has_position {
            return Decision::Hold;
        }
        self.ordered = true;
        Decision::Buy
    }
}

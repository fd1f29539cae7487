//! Trades on predicted rise/fall labels.
//!
//! Buy when the prediction turns to `Rise` while flat; sell when it turns to
//! `Fall` while long. The first prediction of a run counts as a turn.

use std::sync::Arc;

use super::{Decision, MarketView, Strategy, cross_decision};
use crate::domain::features::Label;
use crate::ports::prediction_port::PredictionSource;

pub struct PredictionStrategy {
    source: Arc<dyn PredictionSource>,
    last: Option<Label>,
    name: String,
}

impl PredictionStrategy {
    pub fn new(source: Arc<dyn PredictionSource>) -> Self {
        let name = format!("prediction ({})", source.name());
        Self {
            source,
            last: None,
            name,
        }
    }
}

impl Strategy for PredictionStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, view: &MarketView<'_>) -> Decision {
        let Some(label) = self.source.predict(view.date()) else {
            return Decision::Hold;
        };
        let turned = self.last != Some(label);
        self.last = Some(label);
        cross_decision(
            turned && label == Label::Rise,
            turned && label == Label::Fall,
            view.has_position,
        )
    }
}

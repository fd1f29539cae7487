//! Per-date label predictions from an external classifier.

use chrono::NaiveDate;

use crate::domain::features::Label;

pub trait PredictionSource: Send + Sync {
    /// Predicted label for `date`, or `None` when nothing was predicted.
    fn predict(&self, date: NaiveDate) -> Option<Label>;

    fn name(&self) -> &str;
}

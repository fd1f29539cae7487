//! Predicted labels produced by an external classifier, read from CSV.
//!
//! Expected columns: `date,label`. Labels are `rise`/`fall` or `1`/`0`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::domain::error::SwarmtraderError;
use crate::domain::features::Label;
use crate::ports::prediction_port::PredictionSource;

#[derive(Debug, Deserialize)]
struct PredictionRow {
    date: String,
    label: String,
}

#[derive(Debug, Clone)]
pub struct CsvPredictionAdapter {
    name: String,
    predictions: BTreeMap<NaiveDate, Label>,
}

impl CsvPredictionAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SwarmtraderError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SwarmtraderError::Prediction {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let adapter = Self::from_reader(file, path.display().to_string())?;
        info!(path = %path.display(), predictions = adapter.len(), "loaded predictions");
        Ok(adapter)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        name: impl Into<String>,
    ) -> Result<Self, SwarmtraderError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut predictions = BTreeMap::new();
        for result in rdr.deserialize() {
            let row: PredictionRow = result?;
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
                SwarmtraderError::Prediction {
                    reason: format!("invalid date '{}': {}", row.date, e),
                }
            })?;
            let label = row
                .label
                .parse::<Label>()
                .map_err(|reason| SwarmtraderError::Prediction { reason })?;
            if predictions.insert(date, label).is_some() {
                return Err(SwarmtraderError::Prediction {
                    reason: format!("duplicate prediction for {}", date),
                });
            }
        }
        Ok(Self {
            name: name.into(),
            predictions,
        })
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

impl PredictionSource for CsvPredictionAdapter {
    fn predict(&self, date: NaiveDate) -> Option<Label> {
        self.predictions.get(&date).copied()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

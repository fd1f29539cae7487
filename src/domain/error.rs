//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for swarmtrader.
#[derive(Debug, thiserror::Error)]
pub enum SwarmtraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid date range {start} to {end}: {reason}")]
    DateRange {
        start: NaiveDate,
        end: NaiveDate,
        reason: String,
    },

    #[error("price series is empty")]
    EmptySeries,

    #[error("price series out of order at {date}: {reason}")]
    UnorderedSeries { date: NaiveDate, reason: String },

    #[error("malformed candidate vector: {reason}")]
    Candidate { reason: String },

    #[error("prediction source error: {reason}")]
    Prediction { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SwarmtraderError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SwarmtraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(section: &str, key: &str) -> Self {
        SwarmtraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&SwarmtraderError> for std::process::ExitCode {
    fn from(err: &SwarmtraderError) -> Self {
        let code: u8 = match err {
            SwarmtraderError::Io(_) | SwarmtraderError::Csv(_) => 1,
            SwarmtraderError::ConfigParse { .. }
            | SwarmtraderError::ConfigMissing { .. }
            | SwarmtraderError::ConfigInvalid { .. }
            | SwarmtraderError::DateRange { .. } => 2,
            SwarmtraderError::Data { .. }
            | SwarmtraderError::EmptySeries
            | SwarmtraderError::UnorderedSeries { .. } => 3,
            SwarmtraderError::Candidate { .. } => 4,
            SwarmtraderError::Prediction { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

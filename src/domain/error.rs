// Tuning engine errors
use super::bump_test::BumpTestId;
use super::process_loop::LoopId;
use super::trend::ChartId;
use super::tuning_record::TuningRecordId;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("process loop {0} not found")]
    LoopNotFound(LoopId),

    #[error("trend chart {0} not found")]
    ChartNotFound(ChartId),

    #[error("bump test {0} not found")]
    BumpTestNotFound(BumpTestId),

    #[error("tuning record {0} not found")]
    RecordNotFound(TuningRecordId),

    #[error("invalid {name} range: max {max} must be greater than min {min}")]
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
    },

    #[error("bump test window ends at {end} before it starts at {start}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("lambda must be a positive finite number, got {0}")]
    InvalidLambda(f64),

    #[error("malformed time series: {0}")]
    MalformedSeries(String),

    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}

pub type TuningResult<T> = Result<T, TuningError>;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("Not enough data to fit a model: need at least {required} records, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Every feature of the {0} model is constant; nothing to fit")]
    DegenerateFeatures(String),

    #[error("Prediction horizon must be at least 1")]
    InvalidHorizon,

    #[error("Record {index} has a non-finite {field}")]
    NonFiniteInput { index: usize, field: &'static str },

    #[error("Invalid engine parameters: {0}")]
    InvalidParameters(String),

    #[error("Least-squares solve failed: {0}")]
    Solver(String),
}

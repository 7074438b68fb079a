use crate::metrics::ModelMetrics;
use serde::{Deserialize, Serialize};

/// How the projections in a report were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    /// Standardised features, OLS on the training split, trend projection.
    Regression,
    /// Too few records for a fit: every step predicts the target mean.
    Baseline,
}

/// The output of a single `fit_and_predict` call.
///
/// Nothing here refers back to the fitted models; they are dropped once the
/// report is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    /// One value per horizon step, never negative.
    pub price_predictions: Vec<f64>,
    /// One value per horizon step.
    pub profit_predictions: Vec<f64>,
    pub price_metrics: ModelMetrics,
    pub profit_metrics: ModelMetrics,
    pub method: FitMethod,
    /// Rows that went into the fit after any record cap was applied.
    pub records_used: usize,
    pub train_size: usize,
    /// Zero when metrics were computed in-sample.
    pub test_size: usize,
}

impl PredictionReport {
    pub fn horizon(&self) -> usize {
        self.price_predictions.len()
    }
}

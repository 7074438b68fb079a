//! # Harvest Analytics Engine
//!
//! This crate turns the stored market-data submissions into the numbers shown on
//! the analytics page: projected market prices and net profits, the accuracy of
//! the models behind them, and some plain aggregates.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of the
//!   database, the web layer or the weather service. It depends only on
//!   `core-types` and `configuration` (Layer 0).
//! - **Stateless Calculation:** `PredictionEngine` retrains from the snapshot it is
//!   handed on every call and keeps nothing afterwards. Identical input and
//!   parameters give identical output.
//!
//! ## Public API
//!
//! - `fit_and_predict` / `PredictionEngine`: the price and profit forecaster.
//! - `PredictionReport`: projections plus held-out MSE and R² for both models.
//! - `summarize` / `recent_history`: dataset aggregates for the dashboard.
//! - `CostProfitSummary`: margin, ROI and advice for one set of figures.
//! - `PredictionError`: the error type returned by the engine.

pub mod engine;
pub mod error;
pub mod metrics;
pub mod profitability;
pub mod regression;
pub mod report;
pub mod scaler;
pub mod split;
pub mod summary;
pub mod trend;

pub use engine::{MIN_RECORDS, PredictionEngine, fit_and_predict};
pub use error::PredictionError;
pub use metrics::ModelMetrics;
pub use profitability::{CostProfitSummary, ProfitStatus};
pub use report::{FitMethod, PredictionReport};
pub use summary::{DatasetSummary, HistoryPoint, recent_history, summarize};

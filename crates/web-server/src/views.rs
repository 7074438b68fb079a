//! JSON payloads returned by the handlers.

use analytics::{DatasetSummary, FitMethod, HistoryPoint, PredictionReport};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};
use core_types::{Town, UserAccount};
use serde::Serialize;
use weather::{CurrentConditions, DailyForecast};

/// Asia/Colombo, which has no daylight saving.
const LOCAL_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Days between consecutive projected chart points.
const CHART_STEP_DAYS: i64 = 30;

pub const INSUFFICIENT_DATA_MESSAGE: &str =
    "Not enough data yet to make predictions. Add more cost-profit submissions to unlock the forecast.";

/// Greeting for the local hour in Sri Lanka.
pub fn greeting(now: DateTime<Utc>) -> &'static str {
    let hour = FixedOffset::east_opt(LOCAL_OFFSET_SECS)
        .map(|offset| now.with_timezone(&offset).hour())
        .unwrap_or_else(|| now.hour());
    match hour {
        0..=11 => "Good Morning",
        12..=16 => "Good Afternoon",
        _ => "Good Evening",
    }
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub greeting: Option<&'static str>,
    pub user: Option<UserAccount>,
}

#[derive(Debug, Serialize)]
pub struct TownView {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Town> for TownView {
    fn from(town: Town) -> Self {
        let (latitude, longitude) = town.coordinates();
        Self { name: town.name(), latitude, longitude }
    }
}

#[derive(Debug, Serialize)]
pub struct WeatherView {
    pub town: TownView,
    pub current: CurrentConditions,
    pub forecast: Vec<DailyForecast>,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub message: String,
}

impl MessageView {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionView {
    pub id: i64,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ClearedView {
    pub deleted: u64,
    pub message: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ChartMetrics {
    pub price_mse: f64,
    pub price_r2: Option<f64>,
    pub profit_mse: f64,
    pub profit_r2: Option<f64>,
    pub method: FitMethod,
    pub records_used: usize,
}

/// Everything the analytics chart needs, rounded for display.
#[derive(Debug, Serialize, PartialEq)]
pub struct ChartPayload {
    pub labels: Vec<String>,
    pub price_series: Vec<f64>,
    pub profit_series: Vec<f64>,
    pub metrics: ChartMetrics,
}

impl ChartPayload {
    /// Point `i` (from 1) is labelled `today + 30 * i` days.
    pub fn from_report(report: &PredictionReport, today: NaiveDate) -> Self {
        let labels = (1..=report.horizon() as i64)
            .map(|i| (today + Duration::days(CHART_STEP_DAYS * i)).format("%Y-%m-%d").to_string())
            .collect();

        Self {
            labels,
            price_series: report.price_predictions.iter().copied().map(round2).collect(),
            profit_series: report.profit_predictions.iter().copied().map(round2).collect(),
            metrics: ChartMetrics {
                price_mse: round2(report.price_metrics.mse),
                price_r2: report.price_metrics.r2.map(round2),
                profit_mse: round2(report.profit_metrics.mse),
                profit_r2: report.profit_metrics.r2.map(round2),
                method: report.method,
                records_used: report.records_used,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionView {
    Ready { chart: ChartPayload },
    InsufficientData { message: &'static str },
}

#[derive(Debug, Serialize)]
pub struct AnalyticsView {
    pub summary: DatasetSummary,
    pub history: Vec<HistoryPoint>,
    #[serde(flatten)]
    pub predictions: PredictionView,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

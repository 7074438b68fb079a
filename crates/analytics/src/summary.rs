use chrono::{DateTime, Utc};
use core_types::MarketDataRecord;
use serde::Serialize;
use std::collections::HashSet;

/// Aggregate figures shown above the analytics chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_data_points: usize,
    pub avg_market_price: f64,
    pub avg_profit: f64,
    /// Distinct submitting accounts. Anonymous rows are not counted.
    pub total_users: usize,
    pub first_submission: Option<DateTime<Utc>>,
    pub last_submission: Option<DateTime<Utc>>,
}

/// One row of the "recent submissions" table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub label: String,
    pub market_price: f64,
    pub net_profit: f64,
    pub timestamp: DateTime<Utc>,
}

pub fn summarize(records: &[MarketDataRecord]) -> DatasetSummary {
    let n = records.len();
    let mean = |f: fn(&MarketDataRecord) -> f64| {
        if n == 0 { 0.0 } else { records.iter().map(f).sum::<f64>() / n as f64 }
    };

    let users: HashSet<i64> = records.iter().filter_map(|r| r.user_id).collect();

    DatasetSummary {
        total_data_points: n,
        avg_market_price: mean(|r| r.market_price),
        avg_profit: mean(|r| r.net_profit),
        total_users: users.len(),
        first_submission: records.iter().map(|r| r.timestamp).min(),
        last_submission: records.iter().map(|r| r.timestamp).max(),
    }
}

/// The `limit` newest records, newest first, labelled `Month 1`, `Month 2`, ...
pub fn recent_history(records: &[MarketDataRecord], limit: usize) -> Vec<HistoryPoint> {
    let mut sorted: Vec<&MarketDataRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

    sorted
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, r)| HistoryPoint {
            label: format!("Month {}", i + 1),
            market_price: r.market_price,
            net_profit: r.net_profit,
            timestamp: r.timestamp,
        })
        .collect()
}

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single cost/profit submission, as persisted by the record store.
///
/// Records are created exactly once and never updated. Consumers (the
/// prediction engine in particular) only ever read borrowed snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MarketDataRecord {
    pub id: i64,
    /// `None` for anonymous submissions.
    pub user_id: Option<i64>,
    pub market_price: f64,
    pub harvest_amount: f64,
    pub total_cost: f64,
    pub total_revenue: f64,
    /// Expected to equal `total_revenue - total_cost`; not enforced.
    pub net_profit: f64,
    /// Assigned by the store at write time.
    pub timestamp: DateTime<Utc>,
}

/// A submission that has not been written yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMarketData {
    pub market_price: f64,
    pub harvest_amount: f64,
    pub total_cost: f64,
    pub total_revenue: f64,
    pub net_profit: f64,
}

impl NewMarketData {
    /// Checks the submission before it is allowed into the store.
    ///
    /// Every field must be finite. Price, harvest, cost and revenue must also
    /// be strictly positive; net profit may be negative.
    pub fn validate(&self) -> Result<(), CoreError> {
        let positive = [
            ("market_price", self.market_price),
            ("harvest_amount", self.harvest_amount),
            ("total_cost", self.total_cost),
            ("total_revenue", self.total_revenue),
        ];
        for (field, value) in positive {
            if !value.is_finite() {
                return Err(CoreError::InvalidInput(field.into(), "must be a finite number".into()));
            }
            if value <= 0.0 {
                return Err(CoreError::InvalidInput(field.into(), "must be greater than zero".into()));
            }
        }
        if !self.net_profit.is_finite() {
            return Err(CoreError::InvalidInput(
                "net_profit".into(),
                "must be a finite number".into(),
            ));
        }
        Ok(())
    }
}

/// A registered account. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

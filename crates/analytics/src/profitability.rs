use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitStatus {
    Profitable,
    Loss,
}

const PROFITABLE_ADVICE: [&str; 3] = [
    "Continue with current farming practices",
    "Consider scaling up production if market conditions remain favorable",
    "Monitor market prices for optimal selling timing",
];

const LOSS_ADVICE: [&str; 3] = [
    "Review and optimize cost structure",
    "Consider alternative crops or markets",
    "Analyze cost reduction opportunities",
];

/// A cost/profit breakdown for one set of submitted figures.
///
/// Percentages are in percent, not fractions. `profit_margin_pct` and
/// `roi_pct` describe a profitable result, `loss_pct` a losing one; the
/// field that does not apply is left at its neutral value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostProfitSummary {
    pub market_price: f64,
    pub harvest_amount: f64,
    pub total_cost: f64,
    pub total_revenue: f64,
    pub net_profit: f64,
    pub status: ProfitStatus,
    pub profit_margin_pct: f64,
    pub roi_pct: Option<f64>,
    pub loss_pct: f64,
    pub recommendations: Vec<String>,
}

impl CostProfitSummary {
    pub fn from_figures(
        market_price: f64,
        harvest_amount: f64,
        total_cost: f64,
        total_revenue: f64,
        net_profit: f64,
    ) -> Self {
        let share_of_revenue = |v: f64| if total_revenue > 0.0 { v / total_revenue * 100.0 } else { 0.0 };

        let (status, profit_margin_pct, roi_pct, loss_pct, advice) = if net_profit >= 0.0 {
            let roi = (total_cost > 0.0).then(|| net_profit / total_cost * 100.0);
            (ProfitStatus::Profitable, share_of_revenue(net_profit), roi, 0.0, PROFITABLE_ADVICE)
        } else {
            (ProfitStatus::Loss, 0.0, None, share_of_revenue(net_profit.abs()), LOSS_ADVICE)
        };

        Self {
            market_price,
            harvest_amount,
            total_cost,
            total_revenue,
            net_profit,
            status,
            profit_margin_pct,
            roi_pct,
            loss_pct,
            recommendations: advice.iter().map(|s| s.to_string()).collect(),
        }
    }
}

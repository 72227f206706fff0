use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::holding::HoldingStatus;

/// Aggregate view of all holdings at the current spot price.
///
/// Derived on demand from (holdings, quote). Never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Spot price the figures were computed with (0 when no quote is loaded)
    pub spot_price: f64,

    /// Σ weight × spot price
    pub total_worth: f64,

    /// Σ price paid
    pub total_invested: f64,

    /// Σ weight in grams
    pub total_grams: f64,

    /// Σ collector's premium
    pub total_premium: f64,

    /// total_worth − total_invested
    pub profit_loss: f64,

    /// Per-holding breakdown, in holdings order
    pub holdings: Vec<HoldingSummary>,
}

impl PortfolioSummary {
    pub fn is_profit(&self) -> bool {
        self.profit_loss >= 0.0
    }
}

/// Figures for a single holding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingSummary {
    pub id: Uuid,
    pub name: String,
    pub weight_oz: f64,
    pub current_worth: f64,
    pub value_at_purchase: f64,
    pub collectors_premium: f64,
    pub profit_loss: f64,
    pub status: HoldingStatus,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::weight::TROY_OZ_TO_GRAMS;

/// One purchased silver item.
///
/// **Weight is always troy ounces.** The unit the user typed is converted
/// away in the add-item workflow and not kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: Uuid,

    /// Display name (e.g., "Maple Leaf 2024", "1 kg Heraeus bar")
    pub name: String,

    /// Total amount paid for the item, USD
    pub purchase_price: f64,

    /// Spot price per troy ounce on the purchase day, copied at creation
    pub silver_price_at_purchase: f64,

    pub silver_weight_oz: f64,

    pub purchase_date: NaiveDate,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    pub fn new(
        name: impl Into<String>,
        purchase_price: f64,
        silver_price_at_purchase: f64,
        silver_weight_oz: f64,
        purchase_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            purchase_price,
            silver_price_at_purchase,
            silver_weight_oz,
            purchase_date,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn weight_grams(&self) -> f64 {
        self.silver_weight_oz * TROY_OZ_TO_GRAMS
    }

    /// Melt value on the purchase day.
    pub fn value_at_purchase(&self) -> f64 {
        self.silver_weight_oz * self.silver_price_at_purchase
    }

    /// Melt value at `spot_price`.
    pub fn worth_at(&self, spot_price: f64) -> f64 {
        self.silver_weight_oz * spot_price
    }

    /// Amount paid above melt value at purchase time.
    pub fn collectors_premium(&self) -> f64 {
        self.purchase_price - self.value_at_purchase()
    }
}

/// Traffic-light classification of a holding against the live price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HoldingStatus {
    /// Worth less than its melt value on the purchase day
    Loss,
    /// Above purchase-day melt value but still below the price paid
    BreakingEven,
    /// Worth at least what was paid
    Profit,
}

impl HoldingStatus {
    /// Classify a holding at `spot_price`.
    ///
    /// Both comparisons are strict: a tie falls to the milder class.
    pub fn classify(holding: &Holding, spot_price: f64) -> Self {
        let current_worth = holding.worth_at(spot_price);
        if current_worth < holding.value_at_purchase() {
            HoldingStatus::Loss
        } else if current_worth < holding.purchase_price {
            HoldingStatus::BreakingEven
        } else {
            HoldingStatus::Profit
        }
    }
}

impl std::fmt::Display for HoldingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HoldingStatus::Loss => write!(f, "loss"),
            HoldingStatus::BreakingEven => write!(f, "breaking-even"),
            HoldingStatus::Profit => write!(f, "profit"),
        }
    }
}

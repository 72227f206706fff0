use rand::Rng;

use crate::models::analytics::{HoldingSummary, PortfolioSummary};
use crate::models::holding::{Holding, HoldingStatus};
use crate::models::quote::Quote;

/// Half-width (percent) of the placeholder weekly change used when the
/// quote has no usable previous close.
pub const WEEKLY_CHANGE_PLACEHOLDER: f64 = 4.0;

/// Computes every derived figure shown for a portfolio.
///
/// Pure functions of (holdings, spot price): no I/O, no caching.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    pub fn total_worth(&self, holdings: &[Holding], spot_price: f64) -> f64 {
        holdings.iter().map(|h| h.worth_at(spot_price)).sum()
    }

    pub fn total_invested(&self, holdings: &[Holding]) -> f64 {
        holdings.iter().map(|h| h.purchase_price).sum()
    }

    pub fn total_grams(&self, holdings: &[Holding]) -> f64 {
        holdings.iter().map(Holding::weight_grams).sum()
    }

    pub fn total_premium(&self, holdings: &[Holding]) -> f64 {
        holdings.iter().map(Holding::collectors_premium).sum()
    }

    pub fn profit_loss(&self, holdings: &[Holding], spot_price: f64) -> f64 {
        self.total_worth(holdings, spot_price) - self.total_invested(holdings)
    }

    pub fn holding_profit_loss(&self, holding: &Holding, spot_price: f64) -> f64 {
        holding.worth_at(spot_price) - holding.purchase_price
    }

    pub fn holding_status(&self, holding: &Holding, spot_price: f64) -> HoldingStatus {
        HoldingStatus::classify(holding, spot_price)
    }

    pub fn summarize_holding(&self, holding: &Holding, spot_price: f64) -> HoldingSummary {
        HoldingSummary {
            id: holding.id,
            name: holding.name.clone(),
            weight_oz: holding.silver_weight_oz,
            current_worth: holding.worth_at(spot_price),
            value_at_purchase: holding.value_at_purchase(),
            collectors_premium: holding.collectors_premium(),
            profit_loss: self.holding_profit_loss(holding, spot_price),
            status: self.holding_status(holding, spot_price),
        }
    }

    /// Full summary. Without a quote every holding is valued at zero.
    pub fn summarize(&self, holdings: &[Holding], quote: Option<&Quote>) -> PortfolioSummary {
        let spot_price = quote.map(|q| q.price).unwrap_or(0.0);
        let total_worth = self.total_worth(holdings, spot_price);
        let total_invested = self.total_invested(holdings);

        PortfolioSummary {
            spot_price,
            total_worth,
            total_invested,
            total_grams: self.total_grams(holdings),
            total_premium: self.total_premium(holdings),
            profit_loss: total_worth - total_invested,
            holdings: holdings
                .iter()
                .map(|h| self.summarize_holding(h, spot_price))
                .collect(),
        }
    }

    /// Change against the previous close in percent.
    ///
    /// When the previous close is missing or not positive this returns a
    /// random placeholder in ±4%. The placeholder is a stand-in, not data.
    pub fn weekly_change<R: Rng + ?Sized>(&self, quote: &Quote, rng: &mut R) -> f64 {
        quote.change_pct().unwrap_or_else(|| {
            rng.gen_range(-WEEKLY_CHANGE_PLACEHOLDER..=WEEKLY_CHANGE_PLACEHOLDER)
        })
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}

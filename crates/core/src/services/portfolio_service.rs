use tracing::warn;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::form::HoldingForm;
use crate::models::holding::Holding;
use crate::models::portfolio::Portfolio;

/// Manages the holdings list of a portfolio.
///
/// Pure business logic, no I/O. Easy to test.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Validate the form and build a holding with its weight in troy ounces.
    pub fn create_holding(&self, form: &HoldingForm) -> Result<Holding, CoreError> {
        form.to_holding()
    }

    /// Append a holding. Rejects invalid values and duplicate ids.
    pub fn add_holding(&self, portfolio: &mut Portfolio, holding: Holding) -> Result<(), CoreError> {
        self.validate_holding(&holding)?;
        if portfolio.holdings.iter().any(|h| h.id == holding.id) {
            return Err(CoreError::ValidationError(format!(
                "Holding {} already exists",
                holding.id
            )));
        }
        portfolio.holdings.push(holding);
        Ok(())
    }

    /// Remove a holding by id and return it.
    pub fn remove_holding(&self, portfolio: &mut Portfolio, id: Uuid) -> Result<Holding, CoreError> {
        let idx = portfolio
            .holdings
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| CoreError::HoldingNotFound(id.to_string()))?;
        Ok(portfolio.holdings.remove(idx))
    }

    pub fn get_holding<'a>(&self, portfolio: &'a Portfolio, id: Uuid) -> Option<&'a Holding> {
        portfolio.holdings.iter().find(|h| h.id == id)
    }

    /// Replace the whole list, e.g. after loading from the store.
    ///
    /// Records that break the holding invariants are dropped with a warning.
    /// Returns how many holdings were kept.
    pub fn replace_holdings(&self, portfolio: &mut Portfolio, holdings: Vec<Holding>) -> usize {
        let mut kept = Vec::with_capacity(holdings.len());
        for holding in holdings {
            match self.validate_holding(&holding) {
                Ok(()) if !kept.iter().any(|h: &Holding| h.id == holding.id) => kept.push(holding),
                Ok(()) => warn!(id = %holding.id, "skipping duplicate holding from store"),
                Err(e) => warn!(id = %holding.id, error = %e, "skipping invalid holding from store"),
            }
        }
        portfolio.holdings = kept;
        portfolio.holdings.len()
    }

    /// Rules:
    /// - Name must not be blank
    /// - Price paid, spot price at purchase and weight must be finite and positive
    fn validate_holding(&self, holding: &Holding) -> Result<(), CoreError> {
        if holding.name.trim().is_empty() {
            return Err(CoreError::ValidationError("Holding name must not be empty".into()));
        }
        for (label, value) in [
            ("purchase price", holding.purchase_price),
            ("silver price at purchase", holding.silver_price_at_purchase),
            ("weight", holding.silver_weight_oz),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoreError::ValidationError(format!(
                    "Holding {label} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}

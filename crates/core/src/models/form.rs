use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::holding::Holding;
use super::weight::WeightUnit;
use crate::errors::CoreError;

/// Input state of the "add item" dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingForm {
    pub name: String,
    pub purchase_price: f64,
    pub silver_price_at_purchase: f64,
    /// Weight as typed, in `weight_unit`
    pub silver_weight: f64,
    pub weight_unit: WeightUnit,
    pub purchase_date: Option<NaiveDate>,
}

/// A single reason the form cannot be confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormProblem {
    EmptyName,
    NonPositivePrice,
    NonPositiveSpotPrice,
    NonPositiveWeight,
    MissingDate,
}

impl std::fmt::Display for FormProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormProblem::EmptyName => write!(f, "name must not be empty"),
            FormProblem::NonPositivePrice => write!(f, "purchase price must be positive"),
            FormProblem::NonPositiveSpotPrice => {
                write!(f, "silver price at purchase must be positive")
            }
            FormProblem::NonPositiveWeight => write!(f, "weight must be positive"),
            FormProblem::MissingDate => write!(f, "purchase date is required"),
        }
    }
}

impl HoldingForm {
    /// Empty form with `today` pre-filled as the purchase date.
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            name: String::new(),
            purchase_price: 0.0,
            silver_price_at_purchase: 0.0,
            silver_weight: 0.0,
            weight_unit: WeightUnit::TroyOunce,
            purchase_date: Some(today),
        }
    }

    pub fn reset(&mut self, today: NaiveDate) {
        *self = Self::empty(today);
    }

    /// Every rule the current input breaks. Empty means the form is valid.
    pub fn problems(&self) -> Vec<FormProblem> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push(FormProblem::EmptyName);
        }
        if !is_positive(self.purchase_price) {
            problems.push(FormProblem::NonPositivePrice);
        }
        if !is_positive(self.silver_price_at_purchase) {
            problems.push(FormProblem::NonPositiveSpotPrice);
        }
        // The troy-ounce value is what gets stored: kg can overflow and
        // tiny gram amounts can underflow to zero.
        if !is_positive(self.silver_weight) || !is_positive(self.weight_troy_oz()) {
            problems.push(FormProblem::NonPositiveWeight);
        }
        if self.purchase_date.is_none() {
            problems.push(FormProblem::MissingDate);
        }
        problems
    }

    pub fn is_valid(&self) -> bool {
        self.problems().is_empty()
    }

    /// Weight converted to troy ounces.
    pub fn weight_troy_oz(&self) -> f64 {
        self.weight_unit.to_troy_oz(self.silver_weight)
    }

    /// Validate and build a new holding. The form itself is left untouched.
    pub fn to_holding(&self) -> Result<Holding, CoreError> {
        let problems = self.problems();
        if !problems.is_empty() {
            let joined = problems
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CoreError::ValidationError(joined));
        }
        let purchase_date = self
            .purchase_date
            .ok_or_else(|| CoreError::ValidationError(FormProblem::MissingDate.to_string()))?;

        Ok(Holding::new(
            self.name.trim(),
            self.purchase_price,
            self.silver_price_at_purchase,
            self.weight_troy_oz(),
            purchase_date,
        ))
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

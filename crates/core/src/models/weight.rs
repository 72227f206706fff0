use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;

/// Grams in one troy ounce.
pub const TROY_OZ_TO_GRAMS: f64 = 31.1035;

/// Units a weight can be entered in. Holdings always store troy ounces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeightUnit {
    #[default]
    #[serde(rename = "oz")]
    TroyOunce,
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
}

impl WeightUnit {
    pub const ALL: [WeightUnit; 3] = [WeightUnit::TroyOunce, WeightUnit::Gram, WeightUnit::Kilogram];

    /// Convert `value` in this unit to troy ounces.
    ///
    /// Kilograms go through grams first so results agree with the gram path.
    pub fn to_troy_oz(self, value: f64) -> f64 {
        match self {
            WeightUnit::TroyOunce => value,
            WeightUnit::Gram => value / TROY_OZ_TO_GRAMS,
            WeightUnit::Kilogram => (value * 1000.0) / TROY_OZ_TO_GRAMS,
        }
    }

    /// Convert a troy-ounce weight into this unit.
    pub fn from_troy_oz(self, troy_oz: f64) -> f64 {
        match self {
            WeightUnit::TroyOunce => troy_oz,
            WeightUnit::Gram => troy_oz * TROY_OZ_TO_GRAMS,
            WeightUnit::Kilogram => troy_oz * TROY_OZ_TO_GRAMS / 1000.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            WeightUnit::TroyOunce => "oz",
            WeightUnit::Gram => "g",
            WeightUnit::Kilogram => "kg",
        }
    }
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for WeightUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "oz" | "ozt" | "troy_oz" | "troy-ounce" => Ok(WeightUnit::TroyOunce),
            "g" | "gram" | "grams" => Ok(WeightUnit::Gram),
            "kg" | "kilogram" | "kilograms" => Ok(WeightUnit::Kilogram),
            other => Err(CoreError::ValidationError(format!(
                "Unknown weight unit '{other}'. Supported: oz, g, kg"
            ))),
        }
    }
}

use serde::{Deserialize, Serialize};

use super::holding::Holding;
use super::quote::Quote;

/// The two inputs every derived figure is computed from.
///
/// Holdings are kept in insertion order (oldest first). The quote is the
/// latest one loaded; each refresh replaces it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Portfolio {
    pub holdings: Vec<Holding>,

    /// `None` until the first price load completes.
    pub quote: Option<Quote>,
}

//! Human-readable variation report

use crate::domain::{HistoryTable, PriceVariations};

/// Body used when no product changed price
pub const NO_VARIATION: &str = "No price variation";

/// Builds the report body from computed variations
#[derive(Debug, Clone)]
pub struct ReportComposer {
    currency: String,
}

impl Default for ReportComposer {
    fn default() -> Self {
        Self::new("euro")
    }
}

impl ReportComposer {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    /// One line per variation in ascending id order, or [`NO_VARIATION`].
    ///
    /// The title shown is the product's most recent non-empty title, falling
    /// back to its id.
    pub fn compose(&self, table: &HistoryTable, variations: &PriceVariations) -> String {
        if variations.is_empty() {
            return NO_VARIATION.to_string();
        }

        variations
            .iter()
            .map(|(product_id, delta)| {
                let title = table.latest_title(product_id).unwrap_or(product_id);
                format!("Title: {title}\t price variation: {delta:+.2} {}\n", self.currency)
            })
            .collect()
    }
}

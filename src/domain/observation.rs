use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped price reading for a product.
///
/// `price` is `None` when no extraction pattern matched the page. It is never
/// used in arithmetic without being unwrapped explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "productId")]
    pub product_id: String,
    pub title: String,
    pub price: Option<f64>,
}

impl Observation {
    pub fn new(
        timestamp: DateTime<Utc>,
        product_id: impl Into<String>,
        title: impl Into<String>,
        price: Option<f64>,
    ) -> Self {
        Self {
            timestamp,
            product_id: product_id.into(),
            title: title.into(),
            price,
        }
    }

    /// Observation stamped with the current time
    pub fn now(product_id: impl Into<String>, title: impl Into<String>, price: Option<f64>) -> Self {
        Self::new(Utc::now(), product_id, title, price)
    }

    pub fn has_price(&self) -> bool {
        self.price.is_some()
    }
}

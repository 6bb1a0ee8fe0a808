//! Extraction configuration for product pages
//!
//! Holds the ordered price pattern list and the fixed title element id.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{ParsingError, ParsingResult};

/// A rule for locating the price element, tagged by lookup kind.
///
/// Serialized as `{"key": "class", "value": "..."}` or `{"key": "id", "value": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value")]
pub enum ExtractionPattern {
    /// Element whose class attribute is exactly the value
    #[serde(rename = "class")]
    ByClass(String),
    #[serde(rename = "id")]
    ById(String),
}

impl ExtractionPattern {
    /// CSS selector equivalent of this pattern.
    ///
    /// Attribute selectors are used so class and id values need no escaping.
    pub fn to_css(&self) -> ParsingResult<String> {
        match self {
            Self::ByClass(value) => {
                if value.trim().is_empty() {
                    return Err(ParsingError::invalid_selector(&self.to_string(), "empty class list"));
                }
                // whole attribute, so elements with extra classes do not match
                attribute_selector("class", value, self)
            }
            Self::ById(value) => {
                if value.trim().is_empty() {
                    return Err(ParsingError::invalid_selector(&self.to_string(), "empty id"));
                }
                attribute_selector("id", value.trim(), self)
            }
        }
    }
}

fn attribute_selector(attribute: &str, value: &str, pattern: &ExtractionPattern) -> ParsingResult<String> {
    if value.contains(['"', '\\']) {
        return Err(ParsingError::invalid_selector(
            &pattern.to_string(),
            "quotes and backslashes are not allowed",
        ));
    }
    Ok(format!("[{attribute}=\"{value}\"]"))
}

impl fmt::Display for ExtractionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByClass(value) => write!(f, "class '{value}'"),
            Self::ById(value) => write!(f, "id '{value}'"),
        }
    }
}

/// Main extraction configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Price patterns, tried in order; the first matching element wins
    pub price_patterns: Vec<ExtractionPattern>,

    /// Id of the element holding the product title
    pub title_element_id: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        use crate::infrastructure::config::defaults;
        Self {
            price_patterns: vec![
                ExtractionPattern::ByClass(defaults::PRICE_CLASS_DEAL.to_string()),
                ExtractionPattern::ById(defaults::PRICE_ID_SALE.to_string()),
                ExtractionPattern::ByClass(defaults::PRICE_CLASS_BUYING.to_string()),
            ],
            title_element_id: defaults::TITLE_ELEMENT_ID.to_string(),
        }
    }
}

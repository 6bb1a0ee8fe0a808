//! Parsing error types for product page extraction
//!
//! "No pattern matched" is not an error: the extractors report it as an absent
//! value. The variants here are the failures a caller must surface.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("Invalid extraction pattern: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Price text '{raw}' matched by {pattern} is not a number (normalized: '{normalized}')")]
    PriceParseFailed {
        pattern: String,
        raw: String,
        normalized: String,
    },
}

impl ParsingError {
    /// Create an invalid selector error
    pub fn invalid_selector(selector: &str, reason: &str) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a price parse error for the pattern that matched
    pub fn price_parse_failed(pattern: &str, raw: &str, normalized: &str) -> Self {
        Self::PriceParseFailed {
            pattern: pattern.to_string(),
            raw: raw.to_string(),
            normalized: normalized.to_string(),
        }
    }

    /// Markup drift: the page matched but its content no longer fits the format
    pub fn is_format_drift(&self) -> bool {
        matches!(self, Self::PriceParseFailed { .. })
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;

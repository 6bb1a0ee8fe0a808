//! HTML parsing infrastructure for product pages
//!
//! Trait-based extraction over a parsed `scraper::Html` document: an ordered
//! fallback list for the price, a single fixed element for the title.

pub mod config;
pub mod error;
pub mod price_extractor;
pub mod product_page_parser;
pub mod title_extractor;

// Re-export public types
pub use config::{ExtractionConfig, ExtractionPattern};
pub use error::{ParsingError, ParsingResult};
pub use price_extractor::{PriceExtractor, normalize_price_text, parse_price_text};
pub use product_page_parser::{PageSnapshot, ProductPageParser};
pub use title_extractor::TitleExtractor;

use scraper::{ElementRef, Html};

/// Extractor for one value out of a parsed document
pub trait DocumentExtractor {
    type Output;

    /// Extract the value from the document
    fn extract(&self, html: &Html) -> ParsingResult<Self::Output>;
}

/// Concatenated inner text of an element
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

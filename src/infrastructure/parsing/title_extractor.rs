//! Title extraction from a single fixed element
//!
//! The title element is looked up by id only; there is no fallback list.

use scraper::{Html, Selector};

use super::config::{ExtractionConfig, ExtractionPattern};
use super::price_extractor::compile_pattern;
use super::{DocumentExtractor, ParsingResult, element_text};

/// Looks up the product title in one fixed element; no fallbacks.
pub struct TitleExtractor {
    selector: Selector,
}

impl TitleExtractor {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ExtractionConfig::default())
    }

    pub fn with_config(config: &ExtractionConfig) -> ParsingResult<Self> {
        let pattern = ExtractionPattern::ById(config.title_element_id.clone());
        Ok(Self {
            selector: compile_pattern(&pattern)?,
        })
    }

    /// Trimmed title text, or an empty string when the element is absent
    pub fn extract_title(&self, html: &Html) -> String {
        html.select(&self.selector)
            .next()
            .map(|element| element_text(element).trim().to_string())
            .unwrap_or_default()
    }
}

impl DocumentExtractor for TitleExtractor {
    type Output = String;

    fn extract(&self, html: &Html) -> ParsingResult<Self::Output> {
        Ok(self.extract_title(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title_trims() {
        let extractor = TitleExtractor::new().unwrap();
        let html = Html::parse_document(
            "<html><body><span id=\"productTitle\">\n\n  Il nome della rosa  \n</span></body></html>",
        );
        assert_eq!(extractor.extract_title(&html), "Il nome della rosa");
    }

    #[test]
    fn test_missing_title_is_empty() {
        let extractor = TitleExtractor::new().unwrap();
        let html = Html::parse_document("<html><body><h1>Not it</h1></body></html>");
        assert_eq!(extractor.extract_title(&html), "");
    }
}

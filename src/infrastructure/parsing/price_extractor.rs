//! Price extraction with ordered pattern fallbacks
//!
//! Patterns are tried in configuration order and the first element found wins,
//! even when a later pattern would also match. Prices use a comma decimal
//! separator ("19,99 €"); thousands separators are not supported.

use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::config::{ExtractionConfig, ExtractionPattern};
use super::{DocumentExtractor, ParsingError, ParsingResult, element_text};

/// Currency symbols stripped from either end of the price text
const CURRENCY_PADDING: &[char] = &['€'];

/// Strip whitespace and currency padding, then turn the decimal comma into a point
pub fn normalize_price_text(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || CURRENCY_PADDING.contains(&c))
        .replace(',', ".")
}

/// Parse normalized price text; `None` when it is not a finite number
pub fn parse_price_text(normalized: &str) -> Option<f64> {
    normalized.parse::<f64>().ok().filter(|price| price.is_finite())
}

/// Extracts the product price from a page
pub struct PriceExtractor {
    /// Compiled selectors paired with the pattern they came from
    patterns: Vec<(ExtractionPattern, Selector)>,
}

impl PriceExtractor {
    /// Create a price extractor with the default pattern list
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ExtractionConfig::default())
    }

    /// Create extractor with custom pattern configuration
    pub fn with_config(config: &ExtractionConfig) -> ParsingResult<Self> {
        Self::with_patterns(&config.price_patterns)
    }

    pub fn with_patterns(patterns: &[ExtractionPattern]) -> ParsingResult<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| Ok((pattern.clone(), compile_pattern(pattern)?)))
            .collect::<ParsingResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// `Ok(None)` when no pattern matched; `Err` when a match was not a number
    pub fn extract_price(&self, html: &Html) -> ParsingResult<Option<f64>> {
        for (index, (pattern, selector)) in self.patterns.iter().enumerate() {
            let Some(element) = html.select(selector).next() else {
                continue;
            };

            let raw = element_text(element);
            let normalized = normalize_price_text(&raw);
            debug!("Price matched by pattern {} ({}): '{}'", index, pattern, normalized);

            return parse_price_text(&normalized)
                .map(Some)
                .ok_or_else(|| ParsingError::price_parse_failed(&pattern.to_string(), &raw, &normalized));
        }

        warn!("No price pattern matched ({} patterns tried)", self.patterns.len());
        Ok(None)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &ExtractionPattern> {
        self.patterns.iter().map(|(pattern, _)| pattern)
    }
}

impl DocumentExtractor for PriceExtractor {
    type Output = Option<f64>;

    fn extract(&self, html: &Html) -> ParsingResult<Self::Output> {
        self.extract_price(html)
    }
}

/// Compile a pattern into a selector
pub(crate) fn compile_pattern(pattern: &ExtractionPattern) -> ParsingResult<Selector> {
    let css = pattern.to_css()?;
    Selector::parse(&css).map_err(|e| ParsingError::invalid_selector(&css, &e.to_string()))
}

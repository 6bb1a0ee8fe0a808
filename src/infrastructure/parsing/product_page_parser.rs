//! Product page parser combining title and price extraction
//!
//! Takes the raw page body so the non-`Send` parsed document never outlives
//! a single synchronous call.

use scraper::Html;
use tracing::debug;

use super::config::ExtractionConfig;
use super::{DocumentExtractor, ParsingResult, PriceExtractor, TitleExtractor};

/// What one page yields: a title (possibly empty) and an optional price
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub title: String,
    pub price: Option<f64>,
}

pub struct ProductPageParser {
    title: TitleExtractor,
    price: PriceExtractor,
}

impl ProductPageParser {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ExtractionConfig::default())
    }

    pub fn with_config(config: &ExtractionConfig) -> ParsingResult<Self> {
        Ok(Self {
            title: TitleExtractor::with_config(config)?,
            price: PriceExtractor::with_config(config)?,
        })
    }

    /// Parse a raw HTML body into a snapshot
    pub fn parse(&self, body: &str) -> ParsingResult<PageSnapshot> {
        let html = Html::parse_document(body);
        self.parse_document(&html)
    }

    pub fn parse_document(&self, html: &Html) -> ParsingResult<PageSnapshot> {
        let title = self.title.extract(html)?;
        let price = self.price.extract(html)?;
        debug!("Parsed product page: title='{}' price={:?}", title, price);
        Ok(PageSnapshot { title, price })
    }
}

//! Product catalog - the ordered list of product ids to monitor
//!
//! The catalog file is a one-column CSV whose header names the `id` column.
//! Duplicates are kept; every entry is processed independently.

use thiserror::Error;

/// Header of the column holding product ids
pub const ID_COLUMN: &str = "id";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog has no '{column}' column (header: '{header}')")]
    MissingIdColumn { column: String, header: String },

    #[error("Catalog is empty")]
    Empty,

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductCatalog {
    ids: Vec<String>,
}

impl ProductCatalog {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    /// Parse catalog text with a header row
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

        let header = lines.next().ok_or(CatalogError::Empty)?;
        let column = header
            .split(',')
            .position(|name| name.trim().trim_matches('"').eq_ignore_ascii_case(ID_COLUMN))
            .ok_or_else(|| CatalogError::MissingIdColumn {
                column: ID_COLUMN.to_string(),
                header: header.to_string(),
            })?;

        let ids = lines
            .filter_map(|line| line.split(',').nth(column))
            .map(|id| id.trim().trim_matches('"').to_string())
            .filter(|id| !id.is_empty())
            .collect();

        Ok(Self { ids })
    }

    pub async fn load(path: &std::path::Path) -> Result<Self, CatalogError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ProductCatalog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

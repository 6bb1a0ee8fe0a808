//! Domain module - Core business logic and entities
//!
//! This module contains the price observation record, the product catalog
//! and the variation analysis that turns a product's history into a delta.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod catalog;
pub mod history;
pub mod observation;
pub mod variation;

// Re-export commonly used items for convenience
pub use catalog::{CatalogError, ProductCatalog};
pub use history::HistoryTable;
pub use observation::Observation;
pub use variation::{PriceVariations, compute_variation};

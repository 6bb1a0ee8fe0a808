//! Price Monitor - product price tracking and variation reporting
//!
//! Fetches product pages from a catalog, extracts title and price, appends
//! each reading to a durable history log and reports the latest price change
//! of every product whose price moved.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the pipeline entry point for easier access
pub use application::{MonitorError, PriceMonitor};

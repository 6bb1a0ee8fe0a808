//! Application layer module
//!
//! This module contains the monitoring pipeline and the report composer
//! that orchestrate the domain logic over the infrastructure collaborators.

pub mod price_monitor;
pub mod report;

pub use price_monitor::{CollectionFailure, MonitorError, MonitorResult, PriceMonitor};
pub use report::ReportComposer;

//! Infrastructure layer for page fetching, parsing, storage and external integrations
//!
//! This module provides the HTTP document source, HTML extraction, the
//! observation log, report delivery, configuration and logging.

pub mod config; // Configuration file and defaults
pub mod history_store; // Append-only observation log
pub mod http_client;
pub mod logging; // Logging infrastructure
pub mod parsing; // Product page extraction
pub mod parsing_error; // Extraction error types
pub mod report_sink;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, MailConfig, MonitorConfig, amazon};
pub use history_store::{FileHistoryStore, HistoryError, HistoryResult, HistoryStore, MemoryHistoryStore};
pub use http_client::{DocumentSource, HttpClient, HttpClientConfig};
pub use logging::{get_log_directory, init_logging, init_logging_with_config, log_system_info};
pub use parsing::{
    ExtractionConfig, ExtractionPattern, PageSnapshot, ParsingError, ParsingResult, PriceExtractor,
    ProductPageParser, TitleExtractor,
};
pub use report_sink::{OutboxReportSink, Report, ReportSink};

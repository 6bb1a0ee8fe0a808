//! Configuration infrastructure
//!
//! Contains configuration loading and management for price monitoring.
//!
//! One `AppConfig` is built at start-up and handed to the pipeline; nothing
//! here is global. Relative paths in the monitor section resolve against the
//! directory holding the configuration file.

#![allow(clippy::uninlined_format_args)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::parsing::ExtractionConfig;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Files and report settings for a monitoring run
    pub monitor: MonitorConfig,

    /// Price patterns and title element
    pub extraction: ExtractionConfig,

    /// Page fetching
    pub http: HttpClientConfig,

    /// Report envelope
    pub mail: MailConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Files and report settings for a monitoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Product id list (CSV with an `id` header)
    pub catalog_path: PathBuf,

    /// Append-only observation log
    pub history_path: PathBuf,

    /// Price chart attached to the report when present
    pub chart_path: PathBuf,

    /// Directory receiving composed reports
    pub outbox_dir: PathBuf,

    /// Product page URL prefix; the product id is appended
    pub product_base_url: String,

    pub report_subject: String,
}

/// Sender and receiver written on outgoing reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub sender: String,
    pub receiver: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log directory; defaults to `logs` next to the executable
    pub log_dir: Option<PathBuf>,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(defaults::CATALOG_FILE),
            history_path: PathBuf::from(defaults::HISTORY_FILE),
            chart_path: PathBuf::from(defaults::CHART_FILE),
            outbox_dir: PathBuf::from(defaults::OUTBOX_DIR),
            product_base_url: amazon::PRODUCT_BASE_URL.to_string(),
            report_subject: defaults::REPORT_SUBJECT.to_string(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: defaults::MAIL_SENDER.to_string(),
            receiver: defaults::MAIL_RECEIVER.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters.insert("selectors".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

impl AppConfig {
    /// Make relative monitor paths absolute against `base_dir`
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        let monitor = &mut self.monitor;
        for path in [
            &mut monitor.catalog_path,
            &mut monitor.history_path,
            &mut monitor.chart_path,
            &mut monitor.outbox_dir,
        ] {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
        if let Some(log_dir) = self.logging.log_dir.as_mut().filter(|dir| dir.is_relative()) {
            *log_dir = base_dir.join(&*log_dir);
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Configuration manager for the default location
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE);
        Ok(Self { config_path })
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Directory that relative paths in the configuration refer to
    pub fn base_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read configuration file {:?}", self.config_path))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration file {:?}", self.config_path))?;

        if config.extraction.price_patterns.is_empty() {
            warn!("Configuration has no price patterns; every price will be recorded as missing");
        }

        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Load the configuration and resolve its relative paths
    pub async fn load_resolved(&self) -> Result<AppConfig> {
        let mut config = self.load_config().await?;
        config.resolve_paths(&self.base_dir());
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = self.config_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Product site constants
pub mod amazon {
    /// Product pages are addressed as `{PRODUCT_BASE_URL}{product_id}`
    pub const PRODUCT_BASE_URL: &str = "https://www.amazon.it/dp/";
}

/// Default configuration values
pub mod defaults {
    /// Directory name under the user config directory
    pub const APP_DIR_NAME: &str = "price-monitor";

    pub const CONFIG_FILE: &str = "config.json";

    pub const CATALOG_FILE: &str = "products.txt";

    pub const HISTORY_FILE: &str = "price.csv";

    pub const CHART_FILE: &str = "price.png";

    pub const OUTBOX_DIR: &str = "outbox";

    pub const REPORT_SUBJECT: &str = "Monitor of the price of the books in Amazon";

    pub const MAIL_SENDER: &str = "price-monitor@localhost";

    pub const MAIL_RECEIVER: &str = "price-monitor@localhost";

    // Extraction defaults
    /// Deal price block
    pub const PRICE_CLASS_DEAL: &str = "a-size-base a-color-price a-color-price";

    /// Sale price element
    pub const PRICE_ID_SALE: &str = "priceblock_saleprice";

    /// Regular buying price block
    pub const PRICE_CLASS_BUYING: &str = "a-size-medium a-color-price priceBlockBuyingPriceString";

    pub const TITLE_ELEMENT_ID: &str = "productTitle";

    // HTTP defaults
    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default request rate limit
    pub const MAX_REQUESTS_PER_SECOND: u32 = 2;

    /// Attempts per page before the fetch is reported as failed
    pub const MAX_FETCH_ATTEMPTS: u32 = 5;

    /// Delay between fetch attempts in milliseconds
    pub const RETRY_DELAY_MS: u64 = 2000;

    /// Browsers a request may present itself as
    pub const USER_AGENTS: &[&str] = &[
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
        "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 OPR/110.0.0.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
    ];

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = true;

    /// Log file written by the current run
    pub const LOG_FILE_NAME: &str = "price-monitor.log";

    /// Default maximum log files to keep
    pub const LOG_MAX_FILES: u32 = 5;

    /// Default auto cleanup logs setting
    pub const LOG_AUTO_CLEANUP: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_config_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("conf").join("config.json"));

        let config = manager.load_config().await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(manager.config_path().exists());

        let reloaded = manager.load_config().await.unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "monitor": { "history_path": "/var/lib/prices.csv" },
                 "extraction": { "price_patterns": [ { "key": "id", "value": "price" } ], "title_element_id": "t" } }"#,
        )
        .unwrap();

        let config = ConfigManager::with_path(&path).load_resolved().await.unwrap();
        assert_eq!(config.monitor.history_path, PathBuf::from("/var/lib/prices.csv"));
        assert_eq!(config.monitor.catalog_path, dir.path().join(defaults::CATALOG_FILE));
        assert_eq!(config.extraction.price_patterns.len(), 1);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(ConfigManager::with_path(&path).load_config().await.is_err());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.level.is_empty());
        assert!(config.console_output);
        assert!(config.file_output);
    }
}

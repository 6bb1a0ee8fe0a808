//! Price monitoring pipeline
//!
//! One run is collect, analyze, compose, deliver. The configuration is built
//! once at start-up and handed to [`PriceMonitor::new`]; the monitor keeps no
//! state of its own between runs beyond what the history store persists.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::report::ReportComposer;
use crate::domain::{CatalogError, HistoryTable, Observation, PriceVariations, ProductCatalog};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::history_store::{FileHistoryStore, HistoryError, HistoryStore};
use crate::infrastructure::http_client::{DocumentSource, HttpClient};
use crate::infrastructure::parsing::{ParsingError, ProductPageParser};
use crate::infrastructure::report_sink::{OutboxReportSink, Report, ReportSink};

/// Why one product produced no observation
#[derive(Error, Debug)]
pub enum CollectionFailure {
    #[error("Fetching product {product_id} failed: {error:#}")]
    Fetch {
        product_id: String,
        error: anyhow::Error,
    },

    #[error("Parsing product {product_id} failed: {error}")]
    Parse { product_id: String, error: ParsingError },
}

impl CollectionFailure {
    pub fn product_id(&self) -> &str {
        match self {
            Self::Fetch { product_id, .. } | Self::Parse { product_id, .. } => product_id,
        }
    }
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Collection failed for {} product(s)", .failures.len())]
    Collection { failures: Vec<CollectionFailure> },

    #[error(transparent)]
    Storage(#[from] HistoryError),

    #[error("Report delivery failed: {0:#}")]
    Delivery(anyhow::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Extraction(#[from] ParsingError),
}

pub type MonitorResult<T> = Result<T, MonitorError>;

/// Orchestrates fetching, recording, analysis and reporting
pub struct PriceMonitor {
    source: Arc<dyn DocumentSource>,
    store: Arc<dyn HistoryStore>,
    sink: Arc<dyn ReportSink>,
    parser: ProductPageParser,
    composer: ReportComposer,
    report_subject: String,
    chart_path: PathBuf,
}

impl PriceMonitor {
    /// Create a monitor over explicit collaborators
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn DocumentSource>,
        store: Arc<dyn HistoryStore>,
        sink: Arc<dyn ReportSink>,
    ) -> MonitorResult<Self> {
        Ok(Self {
            source,
            store,
            sink,
            parser: ProductPageParser::with_config(&config.extraction)?,
            composer: ReportComposer::default(),
            report_subject: config.monitor.report_subject.clone(),
            chart_path: config.monitor.chart_path.clone(),
        })
    }

    /// Create a monitor wired to HTTP, the history file and the outbox
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let source = HttpClient::new(config.http.clone(), &config.monitor.product_base_url)?;
        let store = FileHistoryStore::new(&config.monitor.history_path);
        let sink = OutboxReportSink::new(&config.monitor.outbox_dir, config.mail.clone());
        Ok(Self::new(config, Arc::new(source), Arc::new(store), Arc::new(sink))?)
    }

    /// Fetch every catalog product and append one observation each.
    ///
    /// A product that cannot be fetched or parsed is skipped so the rest are
    /// still recorded; the run then fails with every such product listed.
    pub async fn collect(&self, catalog: &ProductCatalog) -> MonitorResult<Vec<Observation>> {
        info!("Collecting prices for {} products", catalog.len());
        let mut recorded = Vec::with_capacity(catalog.len());
        let mut failures = Vec::new();

        for product_id in catalog.iter() {
            match self.observe(product_id).await {
                Ok(observation) => {
                    self.store.append(&observation).await?;
                    info!(
                        "Recorded {}: '{}' at {:?}",
                        observation.product_id, observation.title, observation.price
                    );
                    recorded.push(observation);
                }
                Err(failure) => {
                    error!("{}", failure);
                    failures.push(failure);
                }
            }
        }

        if failures.is_empty() {
            Ok(recorded)
        } else {
            Err(MonitorError::Collection { failures })
        }
    }

    async fn observe(&self, product_id: &str) -> Result<Observation, CollectionFailure> {
        let body = self
            .source
            .fetch_document(product_id)
            .await
            .map_err(|error| CollectionFailure::Fetch {
                product_id: product_id.to_string(),
                error,
            })?;

        let snapshot = self.parser.parse(&body).map_err(|error| CollectionFailure::Parse {
            product_id: product_id.to_string(),
            error,
        })?;

        if snapshot.price.is_none() {
            warn!("No price found for {}; recording it as missing", product_id);
        }
        Ok(Observation::now(product_id, snapshot.title, snapshot.price))
    }

    /// Read the full history and compute the retained variations
    pub async fn analyze(&self, catalog: &ProductCatalog) -> MonitorResult<(HistoryTable, PriceVariations)> {
        let table = self.store.read_all().await?;
        let variations = PriceVariations::from_history(&table, catalog);
        info!(
            "{} of {} products changed price across {} observations",
            variations.len(),
            catalog.len(),
            table.len()
        );
        Ok((table, variations))
    }

    /// Analyze the history and build the report, without delivering it
    pub async fn compose(&self, catalog: &ProductCatalog) -> MonitorResult<Report> {
        let (table, variations) = self.analyze(catalog).await?;
        let chart_exists = tokio::fs::try_exists(&self.chart_path).await.unwrap_or(false);
        let attachment = chart_exists.then(|| self.chart_path.clone());
        Ok(Report {
            subject: self.report_subject.clone(),
            body: self.composer.compose(&table, &variations),
            attachment,
        })
    }

    /// Full cycle: collect, analyze, compose and deliver
    pub async fn run(&self, catalog: &ProductCatalog) -> MonitorResult<Report> {
        self.collect(catalog).await?;
        let report = self.compose(catalog).await?;
        self.sink.deliver(&report).await.map_err(MonitorError::Delivery)?;
        info!("Report '{}' delivered", report.subject);
        Ok(report)
    }

    /// A product's observations in chronological order
    pub async fn history(&self, product_id: &str) -> MonitorResult<Vec<Observation>> {
        let mut series = self.store.read_all().await?.filter_by_id(product_id);
        series.sort_by_key(|observation| observation.timestamp);
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::history_store::MemoryHistoryStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeSource {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl DocumentSource for FakeSource {
        async fn fetch_document(&self, product_id: &str) -> anyhow::Result<String> {
            self.pages
                .get(product_id)
                .cloned()
                .ok_or_else(|| anyhow!("404 for {product_id}"))
        }
    }

    #[derive(Default)]
    struct CapturingSink {
        reports: Mutex<Vec<Report>>,
    }

    #[async_trait]
    impl ReportSink for CapturingSink {
        async fn deliver(&self, report: &Report) -> anyhow::Result<()> {
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl ReportSink for FailingSink {
        async fn deliver(&self, _report: &Report) -> anyhow::Result<()> {
            Err(anyhow!("smtp down"))
        }
    }

    fn page(title: &str, price: &str) -> String {
        format!(
            r#"<html><body><span id="productTitle"> {title} </span>
               <span class="a-size-base a-color-price a-color-price">{price}</span></body></html>"#
        )
    }

    fn source(pages: &[(&str, String)]) -> Arc<FakeSource> {
        Arc::new(FakeSource {
            pages: pages.iter().map(|(id, body)| (id.to_string(), body.clone())).collect(),
        })
    }

    fn monitor(
        source: Arc<FakeSource>,
        store: Arc<MemoryHistoryStore>,
        sink: Arc<dyn ReportSink>,
    ) -> PriceMonitor {
        PriceMonitor::new(&AppConfig::default(), source, store, sink).unwrap()
    }

    fn catalog(ids: &[&str]) -> ProductCatalog {
        ids.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_collect_appends_in_catalog_order() {
        let store = Arc::new(MemoryHistoryStore::new());
        let monitor = monitor(
            source(&[("B", page("Bee", "5,00 €")), ("A", page("Ay", "3,50"))]),
            store.clone(),
            Arc::new(CapturingSink::default()),
        );

        let recorded = monitor.collect(&catalog(&["B", "A", "B"])).await.unwrap();

        let ids: Vec<_> = recorded.iter().map(|o| o.product_id.as_str()).collect();
        assert_eq!(ids, ["B", "A", "B"]);
        assert_eq!(recorded[1].title, "Ay");
        assert_eq!(recorded[1].price, Some(3.5));
        assert_eq!(store.read_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_price_is_recorded() {
        let store = Arc::new(MemoryHistoryStore::new());
        let monitor = monitor(
            source(&[("A", "<span id=\"productTitle\">Ay</span>".to_string())]),
            store.clone(),
            Arc::new(CapturingSink::default()),
        );

        let recorded = monitor.collect(&catalog(&["A"])).await.unwrap();
        assert_eq!(recorded[0].price, None);
        assert_eq!(recorded[0].title, "Ay");
    }

    #[tokio::test]
    async fn test_failures_skip_product_and_abort_report() {
        let store = Arc::new(MemoryHistoryStore::new());
        let sink = Arc::new(CapturingSink::default());
        let monitor = monitor(
            source(&[("A", page("Ay", "1.234,56 €")), ("C", page("Cee", "2"))]),
            store.clone(),
            sink.clone(),
        );

        let err = monitor.run(&catalog(&["A", "B", "C"])).await.unwrap_err();

        match err {
            MonitorError::Collection { failures } => {
                assert_eq!(failures.len(), 2);
                assert!(matches!(&failures[0], CollectionFailure::Parse { product_id, .. } if product_id == "A"));
                assert!(matches!(&failures[1], CollectionFailure::Fetch { .. }));
                assert_eq!(failures[1].product_id(), "B");
            }
            other => panic!("unexpected error: {other}"),
        }
        let table = store.read_all().await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].product_id, "C");
        assert!(sink.reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_reports_only_changed_products() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let store = Arc::new(MemoryHistoryStore::with_records(vec![
            Observation::new(start, "A", "Ay", Some(10.0)),
            Observation::new(start, "B", "Bee", Some(5.0)),
        ]));
        let sink = Arc::new(CapturingSink::default());
        let monitor = monitor(
            source(&[("A", page("Ay", "10")), ("B", page("Bee", "6"))]),
            store,
            sink.clone(),
        );

        let report = monitor.run(&catalog(&["A", "B"])).await.unwrap();

        assert_eq!(report.body, "Title: Bee\t price variation: +1.00 euro\n");
        assert_eq!(report.subject, "Monitor of the price of the books in Amazon");
        assert_eq!(sink.reports.lock().unwrap().as_slice(), [report]);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_reported() {
        let monitor = monitor(
            source(&[("A", page("Ay", "1"))]),
            Arc::new(MemoryHistoryStore::new()),
            Arc::new(FailingSink),
        );
        let err = monitor.run(&catalog(&["A"])).await.unwrap_err();
        assert!(matches!(err, MonitorError::Delivery(_)));
    }

    #[tokio::test]
    async fn test_history_is_chronological() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let store = Arc::new(MemoryHistoryStore::with_records(vec![
            Observation::new(start + Duration::days(2), "A", "late", Some(3.0)),
            Observation::new(start, "B", "other", Some(9.0)),
            Observation::new(start, "A", "early", Some(1.0)),
        ]));
        let monitor = monitor(source(&[]), store, Arc::new(CapturingSink::default()));

        let titles: Vec<_> = monitor
            .history("A")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.title)
            .collect();
        assert_eq!(titles, ["early", "late"]);
    }

    #[test]
    fn test_invalid_pattern_rejected_at_construction() {
        let mut config = AppConfig::default();
        config.extraction.title_element_id = String::new();
        let result = PriceMonitor::new(
            &config,
            source(&[]),
            Arc::new(MemoryHistoryStore::new()),
            Arc::new(CapturingSink::default()),
        );
        assert!(matches!(result, Err(MonitorError::Extraction(_))));
    }
}

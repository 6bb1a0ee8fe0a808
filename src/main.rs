use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use price_monitor_lib::PriceMonitor;
use price_monitor_lib::domain::ProductCatalog;
use price_monitor_lib::infrastructure::{ConfigManager, init_logging_with_config, log_system_info};

#[derive(Parser)]
#[command(name = "price-monitor", version)]
#[command(about = "Track product prices and report the latest variations")]
struct Cli {
    /// Configuration file (created with defaults when missing)
    #[arg(long, env = "PRICE_MONITOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect prices, then compose and deliver the report (default)
    Run,
    /// Collect prices only
    Collect,
    /// Print the report body without delivering it
    Report,
    /// List a product's observations in chronological order
    History {
        /// Product id as listed in the catalog
        id: String,
    },
}

async fn load_catalog(path: &Path) -> Result<ProductCatalog> {
    ProductCatalog::load(path)
        .await
        .with_context(|| format!("Failed to load catalog {:?}", path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let config = manager.load_resolved().await?;

    init_logging_with_config(&config.logging)?;
    log_system_info();
    info!("Using configuration {:?}", manager.config_path());

    let monitor = PriceMonitor::from_config(&config)?;
    let catalog_path = config.monitor.catalog_path.as_path();

    let outcome = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let catalog = load_catalog(catalog_path).await?;
            monitor
                .run(&catalog)
                .await
                .map(|report| info!("Run complete, report '{}' delivered", report.subject))
        }
        Commands::Collect => {
            let catalog = load_catalog(catalog_path).await?;
            monitor.collect(&catalog).await.map(|recorded| {
                info!("Recorded {} observations", recorded.len());
            })
        }
        Commands::Report => {
            let catalog = load_catalog(catalog_path).await?;
            monitor.compose(&catalog).await.map(|report| println!("{}", report.body.trim_end()))
        }
        Commands::History { id } => monitor.history(&id).await.map(|series| {
            for observation in series {
                let price = observation
                    .price
                    .map_or_else(|| "n/a".to_string(), |price| format!("{price:.2}"));
                println!("{}\t{}\t{}", observation.timestamp.to_rfc3339(), price, observation.title);
            }
        }),
    };

    if let Err(e) = &outcome {
        error!("Price monitor aborted: {}", e);
    }
    Ok(outcome?)
}

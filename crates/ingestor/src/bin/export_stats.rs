//! Export the opening statistics table to JSON for the static reporting API.
//!
//! Usage:
//!   cargo run --bin export-stats -- [output_path]
//!
//! Defaults to EXPORT_PATH (api/opening-stats.json).

use std::env;
use std::path::PathBuf;

use ingestor::export::{build_export, write_export};
use ingestor::{IngestConfig, StatsStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = IngestConfig::from_env()?;
    let output_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.export_path));

    let store = StatsStore::connect(&config.database_url).await?;
    store.run_migrations().await?;

    let rows = store.load_stats(None).await?;
    info!(rows = rows.len(), "Loaded opening stats");

    let export = build_export(&rows, &config);
    write_export(&output_path, &export)?;

    store.close().await;
    Ok(())
}

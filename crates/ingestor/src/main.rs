//! Opening statistics ingestor
//!
//! Recomputes per-opening win/loss/draw statistics for every player of the
//! roster from their most recent Chess.com games, then exits.

use std::sync::Arc;

use chess_core::OpeningIndex;
use ingestor::{CancellationFlag, ChessComClient, IngestConfig, Pipeline, StatsStore, Throttle};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file for local dev
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Configuration problems abort before any request is made
    let config = IngestConfig::from_env()?;
    info!(
        players = config.roster.len(),
        games_per_color = config.games_per_color,
        pause_ms = config.archive_pause.as_millis() as u64,
        "Ingestor config loaded"
    );

    let index = Arc::new(OpeningIndex::load(config.eco_files.as_slice()));
    info!(positions = index.len(), "Opening index ready");

    let store = StatsStore::connect(&config.database_url).await?;
    store.run_migrations().await?;

    let client = ChessComClient::new(&config)?;

    let cancel = CancellationFlag::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current archive");
                cancel.cancel();
            }
        }
    });

    let pipeline = Pipeline::new(
        client,
        store.clone(),
        index,
        Throttle::new(config.archive_pause),
        config.games_per_color,
    )
    .with_max_concurrent_players(config.max_concurrent_players)
    .with_cancellation(cancel);

    let report = pipeline.run(&config.roster).await;
    store.close().await;

    for failure in &report.failed {
        error!(username = %failure.username, error = %failure.error, "Needs re-ingestion");
    }
    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "Opening stats updated"
    );

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} players failed to ingest",
            report.failed.len(),
            config.roster.len()
        );
    }
    Ok(())
}

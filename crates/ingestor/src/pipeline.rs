//! Per-player ingestion: fetch, classify, aggregate, flush.

use std::sync::Arc;

use chess_core::{classify, GameOutcome, OpeningIndex, PlayerColor, PlayerStats};
use futures::StreamExt;
use tracing::{error, info, warn};

use crate::clients::ArchiveSource;
use crate::config::Player;
use crate::db::StatsStore;
use crate::error::IngestError;
use crate::fetcher::{fetch_recent_games, CancellationFlag};
use crate::throttle::Throttle;

/// What one successful player run stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
    pub username: String,
    pub white_games: u32,
    pub black_games: u32,
    pub buckets: usize,
}

#[derive(Debug)]
pub struct PlayerFailure {
    pub username: String,
    pub error: IngestError,
}

/// Outcome of a run over the roster, in roster order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub succeeded: Vec<PlayerSummary>,
    pub failed: Vec<PlayerFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Pipeline<S> {
    source: S,
    store: StatsStore,
    index: Arc<OpeningIndex>,
    throttle: Throttle,
    cancel: CancellationFlag,
    games_per_color: u32,
    max_concurrent_players: usize,
}

impl<S: ArchiveSource> Pipeline<S> {
    pub fn new(
        source: S,
        store: StatsStore,
        index: Arc<OpeningIndex>,
        throttle: Throttle,
        games_per_color: u32,
    ) -> Self {
        Self {
            source,
            store,
            index,
            throttle,
            cancel: CancellationFlag::new(),
            games_per_color,
            max_concurrent_players: 1,
        }
    }

    pub fn with_max_concurrent_players(mut self, max: usize) -> Self {
        self.max_concurrent_players = max.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn store(&self) -> &StatsStore {
        &self.store
    }

    /// Scan a player's recent games and aggregate them, without storing.
    ///
    /// Fails if the scan was cut short by an upstream error or cancellation;
    /// a partial window is never returned.
    pub async fn collect_player_stats(&self, username: &str) -> Result<PlayerStats, IngestError> {
        let mut stats = PlayerStats::new();
        let mut games = std::pin::pin!(fetch_recent_games(
            &self.source,
            &self.throttle,
            &self.cancel,
            username,
            self.games_per_color,
        ));

        while let Some(fetched) = games.next().await {
            let fetched = fetched?;
            let opening = classify(&fetched.game, &self.index);
            let outcome = GameOutcome::from_result(fetched.game.result(), fetched.color);
            stats.record(username, &opening, fetched.color, outcome);
        }

        Ok(stats)
    }

    /// Recompute and store one player's statistics.
    pub async fn ingest_player(&self, username: &str) -> Result<PlayerSummary, IngestError> {
        info!(username = %username, "Fetching games");

        let stats = self.collect_player_stats(username).await?;
        self.store.replace_player_stats(username, &stats).await?;

        let summary = PlayerSummary {
            username: username.to_string(),
            white_games: stats.games_for(PlayerColor::White),
            black_games: stats.games_for(PlayerColor::Black),
            buckets: stats.len(),
        };
        info!(
            username = %username,
            white = summary.white_games,
            black = summary.black_games,
            openings = summary.buckets,
            "Finished processing"
        );
        Ok(summary)
    }

    /// Ingest every player of `roster`. A failing player is reported and the
    /// run moves on; rows of players that already finished stay committed.
    pub async fn run(&self, roster: &[Player]) -> RunReport {
        let results: Vec<(String, Result<PlayerSummary, IngestError>)> =
            futures::stream::iter(roster)
                .map(|player| async move {
                    let result = self.ingest_player(&player.username).await;
                    (player.username.clone(), result)
                })
                .buffered(self.max_concurrent_players)
                .collect()
                .await;

        let mut report = RunReport::default();
        for (username, result) in results {
            match result {
                Ok(summary) => report.succeeded.push(summary),
                Err(IngestError::Cancelled) => {
                    warn!(username = %username, "Skipped: run cancelled");
                    report.failed.push(PlayerFailure {
                        username,
                        error: IngestError::Cancelled,
                    });
                }
                Err(e) => {
                    error!(username = %username, error = %e, "Could not ingest player; stored stats left unchanged");
                    report.failed.push(PlayerFailure { username, error: e });
                }
            }
        }
        report
    }
}

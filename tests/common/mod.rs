use std::collections::HashMap;
use std::sync::Arc;

use chess_core::opening_index::{fingerprint, OpeningEntry};
use chess_core::OpeningIndex;
use ingestor::{ArchiveGame, ArchiveMonth, ArchiveSource, IngestError, Pipeline, StatsStore, Throttle};

pub const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
pub const AFTER_E4_C5: &str = "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
pub const AFTER_D4: &str = "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq - 0 1";

/// Archives served per player, in API order (oldest month first).
#[derive(Default)]
pub struct FakeArchive {
    players: HashMap<String, Vec<(ArchiveMonth, Vec<ArchiveGame>)>>,
    broken_players: Vec<String>,
}

impl FakeArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_month(mut self, username: &str, month: u32, games: Vec<ArchiveGame>) -> Self {
        self.players
            .entry(username.to_lowercase())
            .or_default()
            .push((ArchiveMonth { year: 2024, month }, games));
        self
    }

    /// Every request for this player fails as if the API were down.
    pub fn with_broken_player(mut self, username: &str) -> Self {
        self.broken_players.push(username.to_lowercase());
        self
    }

    fn check(&self, username: &str) -> Result<(), IngestError> {
        if self.broken_players.contains(&username.to_lowercase()) {
            Err(IngestError::Upstream("Archives HTTP 503 Service Unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl ArchiveSource for FakeArchive {
    async fn archives(&self, username: &str) -> Result<Vec<ArchiveMonth>, IngestError> {
        self.check(username)?;
        Ok(self
            .players
            .get(&username.to_lowercase())
            .map(|months| months.iter().map(|(m, _)| *m).collect())
            .unwrap_or_default())
    }

    async fn archive_games(
        &self,
        username: &str,
        month: ArchiveMonth,
    ) -> Result<Vec<ArchiveGame>, IngestError> {
        self.check(username)?;
        Ok(self
            .players
            .get(&username.to_lowercase())
            .and_then(|months| months.iter().find(|(m, _)| *m == month))
            .map(|(_, games)| games.clone())
            .unwrap_or_default())
    }
}

/// A standard game between `white` and `black`.
pub fn game(white: &str, black: &str, result: &str, movetext: &str) -> ArchiveGame {
    ArchiveGame {
        pgn: Some(format!(
            "[Event \"Live Chess\"]\n[Site \"Chess.com\"]\n[White \"{white}\"]\n[Black \"{black}\"]\n[Result \"{result}\"]\n\n{movetext} {result}"
        )),
        rules: "chess".to_string(),
    }
}

pub fn variant(white: &str, black: &str) -> ArchiveGame {
    ArchiveGame {
        rules: "chess960".to_string(),
        ..game(white, black, "1-0", "")
    }
}

pub fn reference_index() -> Arc<OpeningIndex> {
    let entries = [
        (AFTER_E4, "King's Pawn Opening"),
        (AFTER_E4_C5, "Sicilian Defense: Bowdler Attack"),
        (AFTER_D4, "Queen's Pawn Opening"),
    ];
    Arc::new(
        entries
            .iter()
            .map(|(fen, name)| OpeningEntry {
                fingerprint: fingerprint(fen).to_string(),
                name: name.to_string(),
            })
            .collect(),
    )
}

pub async fn memory_store() -> StatsStore {
    let store = StatsStore::connect("sqlite::memory:")
        .await
        .expect("in-memory store");
    store.run_migrations().await.expect("schema");
    store
}

pub fn pipeline(source: FakeArchive, store: &StatsStore, quota: u32) -> Pipeline<FakeArchive> {
    Pipeline::new(source, store.clone(), reference_index(), Throttle::unthrottled(), quota)
}

//! Upstream game-archive sources.

use std::fmt;
use std::future::Future;

use serde::Deserialize;

use crate::error::IngestError;

pub mod chess_com;

pub use chess_com::ChessComClient;

/// One monthly archive of a player's games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveMonth {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for ArchiveMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}", self.year, self.month)
    }
}

/// A game as listed in a monthly archive.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveGame {
    #[serde(default)]
    pub pgn: Option<String>,

    /// Variant; standard chess is "chess"
    #[serde(default = "standard_rules")]
    pub rules: String,
}

fn standard_rules() -> String {
    "chess".to_string()
}

impl ArchiveGame {
    pub fn is_standard(&self) -> bool {
        self.rules == "chess"
    }
}

/// Read-only access to a player's archived games.
///
/// Both calls return data in the order the upstream lists it (oldest first
/// for Chess.com); the fetcher applies the newest-first ordering.
pub trait ArchiveSource: Send + Sync {
    fn archives(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Vec<ArchiveMonth>, IngestError>> + Send;

    fn archive_games(
        &self,
        username: &str,
        month: ArchiveMonth,
    ) -> impl Future<Output = Result<Vec<ArchiveGame>, IngestError>> + Send;
}

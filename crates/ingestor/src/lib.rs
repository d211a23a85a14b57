//! Opening statistics ingestion
//!
//! Pulls recent games for a roster of players from the Chess.com archive API,
//! classifies each game's opening and stores per-player, per-opening,
//! per-color results.

pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod pipeline;
pub mod throttle;

pub use clients::{ArchiveGame, ArchiveMonth, ArchiveSource, ChessComClient};
pub use config::{IngestConfig, Player};
pub use db::{StatsStore, StoredStatRow};
pub use error::IngestError;
pub use fetcher::{fetch_recent_games, CancellationFlag, FetchedGame};
pub use pipeline::{Pipeline, PlayerFailure, PlayerSummary, RunReport};
pub use throttle::Throttle;

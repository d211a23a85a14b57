//! Newest-first game scan over a player's monthly archives.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chess_core::{parse_game, ParsedGame, PlayerColor};
use futures::stream::{self, Stream};
use tracing::{debug, info, warn};

use crate::clients::{ArchiveGame, ArchiveMonth, ArchiveSource};
use crate::error::IngestError;
use crate::throttle::Throttle;

/// Set once to stop every running scan after its current archive.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A counted game and the side the tracked player had.
#[derive(Debug, Clone)]
pub struct FetchedGame {
    pub game: ParsedGame,
    pub color: PlayerColor,
}

struct Scan<'a, S> {
    source: &'a S,
    throttle: &'a Throttle,
    cancel: &'a CancellationFlag,
    username: &'a str,
    quota: u32,
    /// Remaining archives, newest first. `None` until the list is fetched.
    months: Option<VecDeque<ArchiveMonth>>,
    /// Games of the current archive in API order; popped from the back.
    pending: Vec<ArchiveGame>,
    white: u32,
    black: u32,
    finished: bool,
}

impl<S: ArchiveSource> Scan<'_, S> {
    fn quota_met(&self) -> bool {
        self.white >= self.quota && self.black >= self.quota
    }

    async fn next_game(&mut self) -> Option<Result<FetchedGame, IngestError>> {
        loop {
            if self.finished || self.quota_met() {
                return None;
            }

            if let Some(raw) = self.pending.pop() {
                if let Some(fetched) = self.accept(raw) {
                    return Some(Ok(fetched));
                }
                continue;
            }

            if let Err(e) = self.load_next_archive().await {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }

    /// Fill `pending` from the next archive, or mark the scan finished when
    /// there are no archives left.
    async fn load_next_archive(&mut self) -> Result<(), IngestError> {
        if self.months.is_none() {
            self.check_cancelled()?;
            let mut months = {
                let _permit = self.throttle.acquire().await;
                self.source.archives(self.username).await?
            };
            months.sort_by(|a, b| b.cmp(a));
            info!(username = %self.username, archives = months.len(), "Fetched archive list");
            self.months = Some(months.into());
        }

        let Some(month) = self.months.as_mut().and_then(VecDeque::pop_front) else {
            debug!(username = %self.username, "Archives exhausted");
            self.finished = true;
            return Ok(());
        };

        self.check_cancelled()?;
        info!(username = %self.username, archive = %month, "Fetching archive");
        let _permit = self.throttle.acquire().await;
        self.pending = self.source.archive_games(self.username, month).await?;
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), IngestError> {
        if self.cancel.is_cancelled() {
            Err(IngestError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Parse and count one archive entry, or `None` if it is skipped.
    fn accept(&mut self, raw: ArchiveGame) -> Option<FetchedGame> {
        if !raw.is_standard() {
            debug!(rules = %raw.rules, "Skipping variant game");
            return None;
        }

        let pgn = raw.pgn?;
        let game = match parse_game(&pgn) {
            Ok(game) => game,
            Err(e) => {
                warn!(username = %self.username, error = %e, "Skipping unparseable game");
                return None;
            }
        };

        let Some(color) = game.player_color(self.username) else {
            warn!(
                username = %self.username,
                white = game.white().unwrap_or("?"),
                black = game.black().unwrap_or("?"),
                "Skipping game the player did not take part in"
            );
            return None;
        };

        let counter = match color {
            PlayerColor::White => &mut self.white,
            PlayerColor::Black => &mut self.black,
        };
        if *counter >= self.quota {
            return None;
        }
        *counter += 1;

        Some(FetchedGame { game, color })
    }
}

/// Stream `username`'s most recent standard games, newest first, keeping at
/// most `quota` games per color.
///
/// The stream ends once both colors reach `quota` or the archives run out.
/// An upstream failure or cancellation is yielded as a single error, after
/// which the stream ends. Unparseable and variant games are skipped.
pub fn fetch_recent_games<'a, S: ArchiveSource>(
    source: &'a S,
    throttle: &'a Throttle,
    cancel: &'a CancellationFlag,
    username: &'a str,
    quota: u32,
) -> impl Stream<Item = Result<FetchedGame, IngestError>> + 'a {
    let scan = Scan {
        source,
        throttle,
        cancel,
        username,
        quota,
        months: None,
        pending: Vec::new(),
        white: 0,
        black: 0,
        finished: false,
    };

    stream::unfold(scan, |mut scan| async move {
        let item = scan.next_game().await?;
        Some((item, scan))
    })
}

//! Per-player opening statistics buckets.

use std::collections::btree_map::{self, BTreeMap};

use serde::Serialize;

use crate::game_data::{GameOutcome, PlayerColor};

/// Identifies one aggregation bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OpeningStatKey {
    pub player_username: String,
    pub opening_name: String,
    pub color: PlayerColor,
}

/// Win/loss/draw counts of one bucket. `games_played` is always the sum of
/// the three outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpeningStatValue {
    wins: u32,
    losses: u32,
    draws: u32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("inconsistent stat row: games_played={games_played}, wins+losses+draws={sum}")]
pub struct InconsistentStats {
    pub games_played: i64,
    pub sum: i64,
}

impl OpeningStatValue {
    pub fn new(wins: u32, losses: u32, draws: u32) -> Self {
        Self { wins, losses, draws }
    }

    /// Rebuild a value from stored columns, rejecting rows that break the
    /// games_played invariant, carry negative counts, or whose total does not
    /// fit a `u32` counter.
    pub fn from_columns(
        games_played: i64,
        wins: i64,
        losses: i64,
        draws: i64,
    ) -> Result<Self, InconsistentStats> {
        let sum = wins.saturating_add(losses).saturating_add(draws);
        let inconsistent = InconsistentStats { games_played, sum };
        if sum != games_played {
            return Err(inconsistent);
        }
        let to_u32 = |n: i64| u32::try_from(n).ok();
        match (to_u32(games_played), to_u32(wins), to_u32(losses), to_u32(draws)) {
            (Some(_), Some(wins), Some(losses), Some(draws)) => Ok(Self::new(wins, losses, draws)),
            _ => Err(inconsistent),
        }
    }

    pub fn record(&mut self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::Win => self.wins += 1,
            GameOutcome::Loss => self.losses += 1,
            GameOutcome::Draw => self.draws += 1,
        }
    }

    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub fn losses(&self) -> u32 {
        self.losses
    }

    pub fn draws(&self) -> u32 {
        self.draws
    }
}

/// In-memory aggregation for one ingestion run. Iterates in key order so
/// flushed rows come out the same way every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerStats {
    buckets: BTreeMap<OpeningStatKey, OpeningStatValue>,
}

impl PlayerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        player_username: &str,
        opening_name: &str,
        color: PlayerColor,
        outcome: GameOutcome,
    ) {
        let key = OpeningStatKey {
            player_username: player_username.to_string(),
            opening_name: opening_name.to_string(),
            color,
        };
        self.buckets.entry(key).or_default().record(outcome);
    }

    pub fn get(&self, key: &OpeningStatKey) -> Option<&OpeningStatValue> {
        self.buckets.get(key)
    }

    /// Games counted for one color across all openings.
    pub fn games_for(&self, color: PlayerColor) -> u32 {
        self.buckets
            .iter()
            .filter(|(k, _)| k.color == color)
            .map(|(_, v)| v.games_played())
            .sum()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, OpeningStatKey, OpeningStatValue> {
        self.buckets.iter()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl<'a> IntoIterator for &'a PlayerStats {
    type Item = (&'a OpeningStatKey, &'a OpeningStatValue);
    type IntoIter = btree_map::Iter<'a, OpeningStatKey, OpeningStatValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(opening: &str, color: PlayerColor) -> OpeningStatKey {
        OpeningStatKey {
            player_username: "realulysse".to_string(),
            opening_name: opening.to_string(),
            color,
        }
    }

    #[test]
    fn test_record_creates_and_increments_buckets() {
        let mut stats = PlayerStats::new();
        stats.record("realulysse", "Italian Game", PlayerColor::White, GameOutcome::Win);
        stats.record("realulysse", "Italian Game", PlayerColor::White, GameOutcome::Draw);
        stats.record("realulysse", "Italian Game", PlayerColor::Black, GameOutcome::Loss);

        let white = stats.get(&key("Italian Game", PlayerColor::White)).unwrap();
        assert_eq!((white.games_played(), white.wins(), white.losses(), white.draws()), (2, 1, 0, 1));

        let black = stats.get(&key("Italian Game", PlayerColor::Black)).unwrap();
        assert_eq!((black.games_played(), black.losses()), (1, 1));
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn test_games_played_is_sum_of_outcomes() {
        let mut stats = PlayerStats::new();
        let outcomes = [GameOutcome::Win, GameOutcome::Loss, GameOutcome::Draw, GameOutcome::Win];
        for (i, outcome) in outcomes.iter().cycle().take(23).enumerate() {
            let opening = if i % 3 == 0 { "French Defense" } else { "Caro-Kann Defense" };
            stats.record("realulysse", opening, PlayerColor::Black, *outcome);
        }

        for (_, v) in &stats {
            assert_eq!(v.games_played(), v.wins() + v.losses() + v.draws());
        }
        assert_eq!(stats.games_for(PlayerColor::Black), 23);
        assert_eq!(stats.games_for(PlayerColor::White), 0);
    }

    #[test]
    fn test_from_columns_checks_invariant() {
        assert_eq!(OpeningStatValue::from_columns(5, 2, 2, 1), Ok(OpeningStatValue::new(2, 2, 1)));
        assert!(OpeningStatValue::from_columns(5, 2, 2, 2).is_err());
        assert!(OpeningStatValue::from_columns(0, 1, -1, 0).is_err());
    }

    #[test]
    fn test_from_columns_rejects_total_beyond_u32() {
        let third = 3_000_000_000_i64;
        assert_eq!(
            OpeningStatValue::from_columns(3 * third, third, third, third),
            Err(InconsistentStats { games_played: 3 * third, sum: 3 * third })
        );
        let max = i64::from(u32::MAX);
        assert!(OpeningStatValue::from_columns(max, max, 0, 0).is_ok());
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let mut stats = PlayerStats::new();
        stats.record("realulysse", "Sicilian Defense", PlayerColor::Black, GameOutcome::Win);
        stats.record("realulysse", "English Opening", PlayerColor::White, GameOutcome::Win);
        stats.record("realulysse", "English Opening", PlayerColor::Black, GameOutcome::Win);

        let order: Vec<(&str, PlayerColor)> = stats
            .iter()
            .map(|(k, _)| (k.opening_name.as_str(), k.color))
            .collect();
        assert_eq!(
            order,
            vec![
                ("English Opening", PlayerColor::White),
                ("English Opening", PlayerColor::Black),
                ("Sicilian Defense", PlayerColor::Black),
            ]
        );
    }
}

//! Opening classification for a parsed game.

use shakmaty::{Chess, Position};

use crate::game_data::ParsedGame;
use crate::opening_index::{position_fingerprint, OpeningIndex};

pub const UNKNOWN_OPENING: &str = "Unknown Opening";

/// Resolve the opening family name of `game`.
///
/// An explicit `Opening` tag wins unless its family part is empty or a
/// placeholder. Otherwise the mainline is replayed and the
/// deepest position found in `index` names the opening, so a later, more
/// specific hit always replaces an earlier one. The initial position is
/// checked too. Names are cut at the first ':' to drop the variation.
pub fn classify(game: &ParsedGame, index: &OpeningIndex) -> String {
    if let Some(family) = game
        .opening()
        .map(family_name)
        .filter(|family| !is_placeholder(family))
    {
        return family;
    }

    let mut pos = Chess::default();
    let mut best_match = index.lookup(&position_fingerprint(&pos));

    for mv in &game.moves {
        pos.play_unchecked(mv.clone());
        if let Some(name) = index.lookup(&position_fingerprint(&pos)) {
            best_match = Some(name);
        }
    }

    match best_match {
        Some(name) => family_name(name),
        None => UNKNOWN_OPENING.to_string(),
    }
}

/// Text before the first ':' of an opening name, trimmed.
pub fn family_name(name: &str) -> String {
    name.split(':').next().unwrap_or(name).trim().to_string()
}

fn is_placeholder(label: &str) -> bool {
    let label = label.trim();
    label.is_empty() || label == "?" || label.eq_ignore_ascii_case("unknown")
}

//! Chess primitives for opening statistics: PGN parsing, the reference
//! opening index, classification and per-player aggregation.

pub mod classifier;
pub mod game_data;
pub mod opening_index;
pub mod pgn;
pub mod stats;

pub use classifier::{classify, UNKNOWN_OPENING};
pub use game_data::{GameOutcome, ParsedGame, PlayerColor};
pub use opening_index::{OpeningEntry, OpeningIndex};
pub use pgn::{parse_game, PgnError};
pub use stats::{OpeningStatKey, OpeningStatValue, PlayerStats};

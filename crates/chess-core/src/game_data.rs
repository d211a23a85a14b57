use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::Move;

/// Side a tracked player sat on in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
}

impl PlayerColor {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerColor::White => "white",
            PlayerColor::Black => "black",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "white" => Some(PlayerColor::White),
            "black" => Some(PlayerColor::Black),
            _ => None,
        }
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a game from the tracked player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
}

impl GameOutcome {
    /// Derive the outcome from a PGN result code ("1-0", "0-1", "1/2-1/2", "*").
    /// Anything that is not a decisive result counts as a draw.
    pub fn from_result(result: &str, color: PlayerColor) -> Self {
        match (result.trim(), color) {
            ("1-0", PlayerColor::White) | ("0-1", PlayerColor::Black) => GameOutcome::Win,
            ("1-0", PlayerColor::Black) | ("0-1", PlayerColor::White) => GameOutcome::Loss,
            _ => GameOutcome::Draw,
        }
    }
}

/// A single game after PGN parsing: tag pairs plus the legal mainline.
#[derive(Debug, Clone)]
pub struct ParsedGame {
    pub headers: HashMap<String, String>,
    pub moves: Vec<Move>,
}

impl ParsedGame {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn white(&self) -> Option<&str> {
        self.header("White")
    }

    pub fn black(&self) -> Option<&str> {
        self.header("Black")
    }

    /// Declared result code, "*" when the tag is missing.
    pub fn result(&self) -> &str {
        self.header("Result").unwrap_or("*")
    }

    pub fn opening(&self) -> Option<&str> {
        self.header("Opening")
    }

    /// Which side `username` played, compared case-insensitively against the
    /// White and Black tags. `None` if the player appears on neither side.
    pub fn player_color(&self, username: &str) -> Option<PlayerColor> {
        if self.white().is_some_and(|w| w.eq_ignore_ascii_case(username)) {
            Some(PlayerColor::White)
        } else if self.black().is_some_and(|b| b.eq_ignore_ascii_case(username)) {
            Some(PlayerColor::Black)
        } else {
            None
        }
    }
}

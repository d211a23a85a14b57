//! PGN parsing: tag pairs plus a legal mainline replayed from the start position.

use std::collections::HashMap;
use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::{Chess, Move, Position};

use crate::game_data::ParsedGame;

const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("no game found in PGN text")]
    Empty,

    #[error("game starts from a custom position")]
    NonStandardStart,

    #[error("illegal or unparseable move {san} at ply {ply}")]
    IllegalMove { san: String, ply: usize },

    #[error("PGN read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Movetext state: the tags collected so far and the replayed mainline.
struct Replay {
    headers: HashMap<String, String>,
    position: Chess,
    moves: Vec<Move>,
}

struct GameCollector;

impl Visitor for GameCollector {
    type Tags = HashMap<String, String>;
    type Movetext = Replay;
    type Output = Result<ParsedGame, PgnError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(HashMap::new())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let key = String::from_utf8_lossy(name).into_owned();
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        tags.insert(key, value);
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        // Filter non-standard positions
        if tags.get("SetUp").map(String::as_str) == Some("1") {
            if let Some(fen) = tags.get("FEN") {
                if fen.trim() != STANDARD_START_FEN {
                    return ControlFlow::Break(Err(PgnError::NonStandardStart));
                }
            }
        }

        ControlFlow::Continue(Replay {
            headers: tags,
            position: Chess::default(),
            moves: Vec::new(),
        })
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, replay: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        match san_plus.san.to_move(&replay.position) {
            Ok(mv) => {
                replay.moves.push(mv.clone());
                replay.position.play_unchecked(mv);
                ControlFlow::Continue(())
            }
            Err(_) => ControlFlow::Break(Err(PgnError::IllegalMove {
                san: san_plus.to_string(),
                ply: replay.moves.len() + 1,
            })),
        }
    }

    fn end_game(&mut self, replay: Self::Movetext) -> Self::Output {
        Ok(ParsedGame {
            headers: replay.headers,
            moves: replay.moves,
        })
    }
}

/// Parse the first game in `pgn`.
///
/// Variations are skipped and comments ignored. A game with no moves is still
/// a valid game; a move that is illegal in the replayed position rejects the
/// whole game.
pub fn parse_game(pgn: &str) -> Result<ParsedGame, PgnError> {
    let mut reader = Reader::new(pgn.as_bytes());
    match reader.read_game(&mut GameCollector)? {
        Some(parsed) => parsed,
        None => Err(PgnError::Empty),
    }
}

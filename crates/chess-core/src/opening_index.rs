//! Reference opening database keyed by piece placement.
//!
//! Reference files are JSON ECO datasets. Two layouts are accepted: an array
//! of `{"fen": .., "name": ..}` records, or an object keyed by FEN whose
//! values carry a `"name"`. Only the piece-placement field of each FEN is
//! kept, so a position reached by a different move order still matches.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use shakmaty::fen::Fen;
use shakmaty::{Chess, EnPassantMode};

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("invalid reference file pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("no reference file matches {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReferenceFile {
    Records(Vec<ReferenceRecord>),
    KeyedByFen(BTreeMap<String, KeyedRecord>),
}

#[derive(Deserialize)]
struct ReferenceRecord {
    fen: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct KeyedRecord {
    name: Option<String>,
}

/// One known opening position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningEntry {
    pub fingerprint: String,
    pub name: String,
}

/// Piece-placement field of a FEN string.
pub fn fingerprint(fen: &str) -> &str {
    fen.split_whitespace().next().unwrap_or("")
}

/// Piece-placement fingerprint of a live position.
pub fn position_fingerprint(pos: &Chess) -> String {
    let fen = Fen::from_position(pos, EnPassantMode::Legal).to_string();
    fingerprint(&fen).to_string()
}

/// Fingerprint → opening name. Read-only once built.
#[derive(Debug, Default, Clone)]
pub struct OpeningIndex {
    by_fingerprint: HashMap<String, String>,
}

impl OpeningIndex {
    /// Load every reference file named by `patterns` (paths or glob patterns).
    ///
    /// Missing or malformed files are skipped with a warning. The result may
    /// be empty; callers still get a usable index.
    pub fn load<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut index = OpeningIndex::default();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            let paths = match expand(pattern) {
                Ok(paths) => paths,
                Err(e) => {
                    tracing::warn!("Skipping reference files: {}", e);
                    continue;
                }
            };

            for path in paths {
                match index.load_file(&path) {
                    Ok(count) => {
                        tracing::info!(path = %path.display(), entries = count, "Loaded reference openings")
                    }
                    Err(e) => tracing::warn!("Skipping reference file: {}", e),
                }
            }
        }

        if index.is_empty() {
            tracing::warn!("No reference openings loaded; classification falls back to PGN headers");
        }

        index
    }

    fn load_file(&mut self, path: &Path) -> Result<usize, ReferenceError> {
        let data = fs::read_to_string(path).map_err(|source| ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ReferenceFile =
            serde_json::from_str(&data).map_err(|source| ReferenceError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let entries: Vec<OpeningEntry> = match file {
            ReferenceFile::Records(records) => records
                .into_iter()
                .filter_map(|r| entry(r.fen.as_deref()?, r.name?))
                .collect(),
            ReferenceFile::KeyedByFen(map) => map
                .into_iter()
                .filter_map(|(fen, r)| entry(&fen, r.name?))
                .collect(),
        };

        let count = entries.len();
        self.extend(entries);
        Ok(count)
    }

    pub fn insert(&mut self, entry: OpeningEntry) {
        self.by_fingerprint.insert(entry.fingerprint, entry.name);
    }

    pub fn lookup(&self, fingerprint: &str) -> Option<&str> {
        self.by_fingerprint.get(fingerprint).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_fingerprint.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fingerprint.is_empty()
    }
}

impl Extend<OpeningEntry> for OpeningIndex {
    fn extend<I: IntoIterator<Item = OpeningEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.insert(entry);
        }
    }
}

impl FromIterator<OpeningEntry> for OpeningIndex {
    fn from_iter<I: IntoIterator<Item = OpeningEntry>>(iter: I) -> Self {
        let mut index = OpeningIndex::default();
        index.extend(iter);
        index
    }
}

fn entry(fen: &str, name: String) -> Option<OpeningEntry> {
    let key = fingerprint(fen);
    if key.is_empty() || name.trim().is_empty() {
        return None;
    }
    Some(OpeningEntry {
        fingerprint: key.to_string(),
        name,
    })
}

/// Expand a path or glob pattern into existing files, sorted.
fn expand(pattern: &str) -> Result<Vec<PathBuf>, ReferenceError> {
    let mut paths: Vec<PathBuf> = glob::glob(pattern)
        .map_err(|source| ReferenceError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();

    if paths.is_empty() {
        return Err(ReferenceError::NotFound(pattern.to_string()));
    }

    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> String {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_fingerprint_strips_state_fields() {
        assert_eq!(fingerprint(AFTER_E4), "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR");
        assert_eq!(
            position_fingerprint(&Chess::default()),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"
        );
    }

    #[test]
    fn test_load_record_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "ecoB.json",
            &format!(r#"[{{"eco": "B00", "fen": "{AFTER_E4}", "name": "King's Pawn Opening", "moves": "1. e4"}},
                        {{"eco": "B??", "name": "no fen here"}}]"#),
        );

        let index = OpeningIndex::load(&[path]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup(fingerprint(AFTER_E4)), Some("King's Pawn Opening"));
    }

    #[test]
    fn test_load_object_keyed_by_fen() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "ecoB.json",
            &format!(r#"{{"{AFTER_E4}": {{"eco": "B00", "name": "King's Pawn Opening"}}}}"#),
        );

        let index = OpeningIndex::load(&[path]);
        assert_eq!(index.lookup(fingerprint(AFTER_E4)), Some("King's Pawn Opening"));
    }

    #[test]
    fn test_missing_and_malformed_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(
            &dir,
            "ecoC.json",
            &format!(r#"[{{"fen": "{AFTER_E4}", "name": "King's Pawn Opening"}}]"#),
        );
        let bad = write_file(&dir, "ecoD.json", "{ not json");
        let missing = dir.path().join("ecoE.json").to_string_lossy().into_owned();

        let index = OpeningIndex::load(&[missing, bad, good]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_nothing_loaded_gives_empty_index() {
        let index = OpeningIndex::load(&["/definitely/not/here/eco*.json"]);
        assert!(index.is_empty());
        assert_eq!(index.lookup("anything"), None);
    }

    #[test]
    fn test_glob_loads_in_sorted_order_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir,
            "ecoA.json",
            &format!(r#"[{{"fen": "{AFTER_E4}", "name": "First"}}]"#),
        );
        write_file(
            &dir,
            "ecoB.json",
            &format!(r#"[{{"fen": "{AFTER_E4}", "name": "Second"}}]"#),
        );
        let pattern = dir.path().join("eco*.json").to_string_lossy().into_owned();

        let index = OpeningIndex::load(&[pattern]);
        assert_eq!(index.lookup(fingerprint(AFTER_E4)), Some("Second"));
    }
}

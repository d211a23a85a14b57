//! Ingestor configuration from environment variables

use std::env;
use std::time::Duration;

use crate::error::IngestError;

const DEFAULT_ECO_FILES: &str = "ecoA.json,ecoB.json,ecoC.json,ecoD.json,ecoE.json";

/// One tracked player: the name shown in reports and the Chess.com username.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub display_name: String,
    pub username: String,
}

#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// sqlite:... or postgres://... connection URL
    pub database_url: String,

    /// Players to ingest, in run order
    pub roster: Vec<Player>,

    /// Most recent games kept per color and player
    pub games_per_color: u32,

    /// Reference opening files (paths or glob patterns)
    pub eco_files: Vec<String>,

    /// Pause enforced between upstream requests
    pub archive_pause: Duration,

    /// Players processed concurrently
    pub max_concurrent_players: usize,

    /// Chess.com public API root
    pub chess_com_base_url: String,

    pub user_agent: String,

    pub http_timeout: Duration,

    /// Output path of the JSON export
    pub export_path: String,
}

impl IngestConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, IngestError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IngestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| IngestError::Config("DATABASE_URL not set".into()))?;

        let roster = lookup("ROSTER")
            .ok_or_else(|| IngestError::Config("ROSTER not set".into()))
            .and_then(|v| parse_roster(&v))?;

        let games_per_color = lookup("GAMES_PER_COLOR")
            .ok_or_else(|| IngestError::Config("GAMES_PER_COLOR not set".into()))?
            .trim()
            .parse()
            .map_err(|e| IngestError::Config(format!("GAMES_PER_COLOR is not a count: {e}")))?;

        let eco_files = lookup("ECO_FILES")
            .unwrap_or_else(|| DEFAULT_ECO_FILES.to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let archive_pause = Duration::from_millis(parse_or(&lookup, "ARCHIVE_PAUSE_MS", 1000)?);

        let max_concurrent_players = parse_or(&lookup, "MAX_CONCURRENT_PLAYERS", 1usize)?.max(1);

        let chess_com_base_url = lookup("CHESS_COM_BASE_URL")
            .unwrap_or_else(|| "https://api.chess.com/pub".to_string())
            .trim_end_matches('/')
            .to_string();

        let user_agent =
            lookup("HTTP_USER_AGENT").unwrap_or_else(|| "OpeningStats/1.0".to_string());

        let http_timeout = Duration::from_secs(parse_or(&lookup, "HTTP_TIMEOUT_SECS", 30)?);

        let export_path =
            lookup("EXPORT_PATH").unwrap_or_else(|| "api/opening-stats.json".to_string());

        Ok(Self {
            database_url,
            roster,
            games_per_color,
            eco_files,
            archive_pause,
            max_concurrent_players,
            chess_com_base_url,
            user_agent,
            http_timeout,
            export_path,
        })
    }

    /// Display name for a username, falling back to the username itself.
    pub fn display_name<'a>(&'a self, username: &'a str) -> &'a str {
        self.roster
            .iter()
            .find(|p| p.username.eq_ignore_ascii_case(username))
            .map(|p| p.display_name.as_str())
            .unwrap_or(username)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, IngestError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| IngestError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}

/// Parse `Display:username,...`. An entry without a display name uses the
/// username for both.
pub fn parse_roster(value: &str) -> Result<Vec<Player>, IngestError> {
    let mut roster = Vec::new();

    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (display_name, username) = match entry.split_once(':') {
            Some((name, username)) => (name.trim(), username.trim()),
            None => (entry, entry),
        };
        if username.is_empty() {
            return Err(IngestError::Config(format!("ROSTER entry '{entry}' has no username")));
        }
        roster.push(Player {
            display_name: if display_name.is_empty() { username } else { display_name }.to_string(),
            username: username.to_string(),
        });
    }

    if roster.is_empty() {
        return Err(IngestError::Config("ROSTER is empty".into()));
    }
    Ok(roster)
}

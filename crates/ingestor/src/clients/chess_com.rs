use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{ArchiveGame, ArchiveMonth, ArchiveSource};
use crate::config::IngestConfig;
use crate::error::IngestError;

#[derive(Deserialize)]
struct ArchiveList {
    #[serde(default)]
    archives: Vec<String>,
}

#[derive(Deserialize)]
struct ArchiveGames {
    #[serde(default)]
    games: Vec<ArchiveGame>,
}

pub struct ChessComClient {
    client: Client,
    base_url: String,
}

impl ChessComClient {
    pub fn new(config: &IngestConfig) -> Result<Self, IngestError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| IngestError::Upstream(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.chess_com_base_url.clone(),
        })
    }
}

impl ArchiveSource for ChessComClient {
    /// Fetch the list of monthly archives, in API order (oldest first).
    async fn archives(&self, username: &str) -> Result<Vec<ArchiveMonth>, IngestError> {
        let url = format!("{}/player/{}/games/archives", self.base_url, username);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IngestError::Upstream(format!("Archives request error: {e}")))?;

        if !resp.status().is_success() {
            return Err(IngestError::Upstream(format!("Archives HTTP {}", resp.status())));
        }

        let list: ArchiveList = resp
            .json()
            .await
            .map_err(|e| IngestError::Upstream(format!("Archives JSON parse error: {e}")))?;

        Ok(list
            .archives
            .iter()
            .filter_map(|url| {
                let month = parse_archive_url(url);
                if month.is_none() {
                    tracing::warn!(url = %url, "Ignoring unrecognised archive URL");
                }
                month
            })
            .collect())
    }

    /// Fetch one month of games, in API order (oldest first).
    async fn archive_games(
        &self,
        username: &str,
        month: ArchiveMonth,
    ) -> Result<Vec<ArchiveGame>, IngestError> {
        let url = format!(
            "{}/player/{}/games/{}/{:02}",
            self.base_url, username, month.year, month.month
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IngestError::Upstream(format!("Request error for {month}: {e}")))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(vec![]);
        }

        if !resp.status().is_success() {
            return Err(IngestError::Upstream(format!("HTTP {} for {month}", resp.status())));
        }

        let data: ArchiveGames = resp
            .json()
            .await
            .map_err(|e| IngestError::Upstream(format!("JSON parse error for {month}: {e}")))?;

        Ok(data.games)
    }
}

/// URLs look like "https://api.chess.com/pub/player/username/games/2024/03"
pub fn parse_archive_url(url: &str) -> Option<ArchiveMonth> {
    let mut parts = url.trim_end_matches('/').rsplit('/');
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(ArchiveMonth { year, month })
}

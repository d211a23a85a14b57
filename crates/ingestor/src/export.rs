//! JSON export of the statistics table for the static reporting API.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::config::IngestConfig;
use crate::db::StoredStatRow;
use crate::error::IngestError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    /// Display name from the roster
    pub player: String,
    pub player_username: String,
    pub opening_name: String,
    pub color: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

pub fn build_export(rows: &[StoredStatRow], config: &IngestConfig) -> Vec<ExportRow> {
    rows.iter()
        .map(|row| ExportRow {
            player: config.display_name(&row.key.player_username).to_string(),
            player_username: row.key.player_username.clone(),
            opening_name: row.key.opening_name.clone(),
            color: row.key.color.as_str().to_string(),
            games_played: row.value.games_played(),
            wins: row.value.wins(),
            losses: row.value.losses(),
            draws: row.value.draws(),
        })
        .collect()
}

/// Write `rows` as pretty JSON, creating the parent directory if needed.
pub fn write_export(path: &Path, rows: &[ExportRow]) -> Result<(), IngestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(rows)?;
    fs::write(path, json)?;
    info!(path = %path.display(), records = rows.len(), "Wrote opening stats export");
    Ok(())
}

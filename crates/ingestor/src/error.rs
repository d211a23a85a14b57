//! Ingestor error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored row for {player} / {opening} / {color} is invalid: {reason}")]
    InvalidRow {
        player: String,
        opening: String,
        color: String,
        reason: String,
    },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Ingestion cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

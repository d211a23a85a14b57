//! Storage for aggregated opening statistics.
//!
//! Two backends share one table layout: a local SQLite file and a remote
//! Postgres database. The backend is picked from the connection URL.

use std::str::FromStr;
use std::time::Duration;

use chess_core::stats::{OpeningStatKey, OpeningStatValue, PlayerStats};
use chess_core::PlayerColor;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::IngestError;

const SQLITE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS opening_stats (
    player_username TEXT    NOT NULL,
    opening_name    TEXT    NOT NULL,
    color           TEXT    NOT NULL CHECK (color IN ('white', 'black')),
    games_played    INTEGER NOT NULL,
    wins            INTEGER NOT NULL,
    losses          INTEGER,
    draws           INTEGER NOT NULL,
    PRIMARY KEY (player_username, opening_name, color)
);
"#;

const POSTGRES_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS opening_stats (
    player_username TEXT   NOT NULL,
    opening_name    TEXT   NOT NULL,
    color           TEXT   NOT NULL CHECK (color IN ('white', 'black')),
    games_played    BIGINT NOT NULL,
    wins            BIGINT NOT NULL,
    losses          BIGINT,
    draws           BIGINT NOT NULL,
    PRIMARY KEY (player_username, opening_name, color)
);
"#;

/// `losses` may be missing in older tables; derive it from the other columns.
const SELECT_COLUMNS: &str = "player_username, opening_name, color, games_played, wins, \
     COALESCE(losses, games_played - (wins + draws)) AS losses, draws";

const ORDER_BY: &str = "ORDER BY player_username, games_played DESC, opening_name, color";

type StatRow = (String, String, String, i64, i64, i64, i64);

/// One persisted bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredStatRow {
    pub key: OpeningStatKey,
    pub value: OpeningStatValue,
}

impl StoredStatRow {
    fn from_row(row: StatRow) -> Result<Self, IngestError> {
        let (player_username, opening_name, color, games_played, wins, losses, draws) = row;
        let invalid = |reason: String| IngestError::InvalidRow {
            player: player_username.clone(),
            opening: opening_name.clone(),
            color: color.clone(),
            reason,
        };

        let parsed_color =
            PlayerColor::parse(&color).ok_or_else(|| invalid(format!("unknown color '{color}'")))?;
        let value = OpeningStatValue::from_columns(games_played, wins, losses, draws)
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            key: OpeningStatKey {
                player_username,
                opening_name,
                color: parsed_color,
            },
            value,
        })
    }
}

/// Handle to the statistics table. Cheap to clone.
#[derive(Clone, Debug)]
pub enum StatsStore {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

impl StatsStore {
    /// Connect using a `sqlite:` or `postgres://` URL. SQLite files are
    /// created if missing.
    pub async fn connect(database_url: &str) -> Result<Self, IngestError> {
        if database_url.starts_with("sqlite:") {
            let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
            let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

            // An in-memory database lives only as long as its one connection.
            let pool = if in_memory {
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await?
            } else {
                SqlitePoolOptions::new()
                    .max_connections(4)
                    .connect_with(options)
                    .await?
            };
            info!("Connected to SQLite statistics store");
            Ok(StatsStore::Sqlite(pool))
        } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(10))
                .connect(database_url)
                .await?;
            info!("Connected to Postgres statistics store");
            Ok(StatsStore::Postgres(pool))
        } else {
            Err(IngestError::Config(
                "DATABASE_URL must start with sqlite:, postgres:// or postgresql://".into(),
            ))
        }
    }

    /// Create the statistics table if it does not exist.
    pub async fn run_migrations(&self) -> Result<(), IngestError> {
        match self {
            StatsStore::Sqlite(pool) => {
                sqlx::raw_sql(SQLITE_SCHEMA_SQL).execute(pool).await?;
            }
            StatsStore::Postgres(pool) => {
                sqlx::raw_sql(POSTGRES_SCHEMA_SQL).execute(pool).await?;
            }
        }
        Ok(())
    }

    /// Replace every stored row of `username` with `stats` in one
    /// transaction. An empty `stats` clears the player.
    pub async fn replace_player_stats(
        &self,
        username: &str,
        stats: &PlayerStats,
    ) -> Result<(), IngestError> {
        match self {
            StatsStore::Sqlite(pool) => {
                let mut tx = pool.begin().await?;

                sqlx::query("DELETE FROM opening_stats WHERE player_username = ?")
                    .bind(username)
                    .execute(&mut *tx)
                    .await?;

                for (key, value) in stats {
                    sqlx::query(
                        "INSERT INTO opening_stats \
                         (player_username, opening_name, color, games_played, wins, losses, draws) \
                         VALUES (?, ?, ?, ?, ?, ?, ?)",
                    )
                    .bind(username)
                    .bind(&key.opening_name)
                    .bind(key.color.as_str())
                    .bind(i64::from(value.games_played()))
                    .bind(i64::from(value.wins()))
                    .bind(i64::from(value.losses()))
                    .bind(i64::from(value.draws()))
                    .execute(&mut *tx)
                    .await?;
                }

                tx.commit().await?;
            }
            StatsStore::Postgres(pool) => {
                let mut tx = pool.begin().await?;

                sqlx::query("DELETE FROM opening_stats WHERE player_username = $1")
                    .bind(username)
                    .execute(&mut *tx)
                    .await?;

                for (key, value) in stats {
                    sqlx::query(
                        "INSERT INTO opening_stats \
                         (player_username, opening_name, color, games_played, wins, losses, draws) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7)",
                    )
                    .bind(username)
                    .bind(&key.opening_name)
                    .bind(key.color.as_str())
                    .bind(i64::from(value.games_played()))
                    .bind(i64::from(value.wins()))
                    .bind(i64::from(value.losses()))
                    .bind(i64::from(value.draws()))
                    .execute(&mut *tx)
                    .await?;
                }

                tx.commit().await?;
            }
        }

        info!(username = %username, rows = stats.len(), "Replaced opening stats");
        Ok(())
    }

    /// Stored rows, for one player or everyone, ordered by player then most
    /// played opening.
    pub async fn load_stats(&self, username: Option<&str>) -> Result<Vec<StoredStatRow>, IngestError> {
        let rows: Vec<StatRow> = match (self, username) {
            (StatsStore::Sqlite(pool), Some(username)) => {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM opening_stats WHERE player_username = ? {ORDER_BY}"
                );
                sqlx::query_as(&sql).bind(username).fetch_all(pool).await?
            }
            (StatsStore::Sqlite(pool), None) => {
                let sql = format!("SELECT {SELECT_COLUMNS} FROM opening_stats {ORDER_BY}");
                sqlx::query_as(&sql).fetch_all(pool).await?
            }
            (StatsStore::Postgres(pool), Some(username)) => {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM opening_stats WHERE player_username = $1 {ORDER_BY}"
                );
                sqlx::query_as(&sql).bind(username).fetch_all(pool).await?
            }
            (StatsStore::Postgres(pool), None) => {
                let sql = format!("SELECT {SELECT_COLUMNS} FROM opening_stats {ORDER_BY}");
                sqlx::query_as(&sql).fetch_all(pool).await?
            }
        };

        rows.into_iter().map(StoredStatRow::from_row).collect()
    }

    pub async fn close(&self) {
        match self {
            StatsStore::Sqlite(pool) => pool.close().await,
            StatsStore::Postgres(pool) => pool.close().await,
        }
    }
}

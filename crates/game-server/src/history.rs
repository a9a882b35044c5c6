//! Persistence of finished games.
//!
//! The registry hands every finished game that involved at least one
//! account to a [`HistorySink`]. [`SqliteHistory`] stores them in a single
//! table; [`DiscardHistory`] drops them.

use crate::session::{AccountId, GameId};
use chess_core::Color;
use chess_engine::EndReason;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Outcome of one game, as handed to the history sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedGameRecord {
    pub game_id: GameId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// `None` for a draw.
    pub winner: Option<Color>,
    pub reason: EndReason,
    pub white_account_id: Option<AccountId>,
    pub black_account_id: Option<AccountId>,
}

/// Destination for finished games. Called from a blocking worker thread.
pub trait HistorySink: Send + Sync {
    fn persist(&self, record: &FinishedGameRecord) -> Result<(), HistoryError>;
}

/// Drops every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardHistory;

impl HistorySink for DiscardHistory {
    fn persist(&self, record: &FinishedGameRecord) -> Result<(), HistoryError> {
        tracing::debug!(game_id = %record.game_id, "No history store configured, dropping record");
        Ok(())
    }
}

/// SQLite-backed history of finished games.
pub struct SqliteHistory {
    conn: Mutex<Connection>,
}

impl SqliteHistory {
    /// Opens or creates the database at `path` and ensures the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        Self::init(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> Result<Self, HistoryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS finished_games (
                id TEXT PRIMARY KEY,
                started_at TEXT NOT NULL,
                ended_at TEXT NOT NULL,
                winner TEXT,
                reason TEXT NOT NULL,
                white_account_id INTEGER,
                black_account_id INTEGER
            );
            ",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns every stored game, oldest end time first.
    pub fn finished_games(&self) -> Result<Vec<FinishedGameRecord>, HistoryError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, started_at, ended_at, winner, reason, white_account_id, black_account_id
             FROM finished_games ORDER BY ended_at, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<AccountId>>(5)?,
                row.get::<_, Option<AccountId>>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (game_id, started_at, ended_at, winner, reason, white, black) = row?;
            let winner = match winner.as_deref() {
                None => None,
                Some("WHITE") => Some(Color::White),
                Some("BLACK") => Some(Color::Black),
                Some(other) => return Err(HistoryError::Corrupt(format!("winner {other}"))),
            };
            let reason = EndReason::from_name(&reason)
                .ok_or_else(|| HistoryError::Corrupt(format!("reason {reason}")))?;
            records.push(FinishedGameRecord {
                game_id,
                started_at: DateTime::parse_from_rfc3339(&started_at)?.with_timezone(&Utc),
                ended_at: DateTime::parse_from_rfc3339(&ended_at)?.with_timezone(&Utc),
                winner,
                reason,
                white_account_id: white,
                black_account_id: black,
            });
        }
        Ok(records)
    }
}

impl HistorySink for SqliteHistory {
    fn persist(&self, record: &FinishedGameRecord) -> Result<(), HistoryError> {
        let winner = record.winner.map(|color| match color {
            Color::White => "WHITE",
            Color::Black => "BLACK",
        });
        self.conn().execute(
            "INSERT INTO finished_games
                (id, started_at, ended_at, winner, reason, white_account_id, black_account_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.game_id,
                record.started_at.to_rfc3339(),
                record.ended_at.to_rfc3339(),
                winner,
                record.reason.as_str(),
                record.white_account_id,
                record.black_account_id,
            ],
        )?;
        tracing::info!(game_id = %record.game_id, reason = record.reason.as_str(), "Stored finished game");
        Ok(())
    }
}

use crate::app_dirs::AppDirs;
use crate::score::{BestScoreStore, GameRecord, StoreError, BEST_SCORE_KEY};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// SQLite store for the best score and the history of finished games
#[derive(Debug)]
pub struct ScoreDb {
    conn: Connection,
}

impl ScoreDb {
    /// Open the database at the default state path, creating it if needed
    pub fn new() -> Result<Self, StoreError> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("swatch_scores.db"));
        Self::with_path(db_path)
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "opening score database");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                score INTEGER NOT NULL,
                rounds INTEGER NOT NULL,
                correct INTEGER NOT NULL,
                wrong INTEGER NOT NULL,
                timeouts INTEGER NOT NULL,
                finished_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_games_finished_at ON games(finished_at)",
            [],
        )?;

        Ok(ScoreDb { conn })
    }

    /// Raw stored text for a key
    pub fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

}

impl BestScoreStore for ScoreDb {
    fn get_best(&self) -> Option<u32> {
        match self.get_raw(BEST_SCORE_KEY) {
            Ok(raw) => raw?.trim().parse().ok(),
            Err(e) => {
                warn!(error = %e, "failed to read best score");
                None
            }
        }
    }

    fn set_best(&self, best: u32) -> Result<(), StoreError> {
        self.set_raw(BEST_SCORE_KEY, &best.to_string())
    }

    fn record_game(&self, record: &GameRecord) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO games (score, rounds, correct, wrong, timeouts, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.score,
                record.rounds,
                record.correct,
                record.wrong,
                record.timeouts,
                record.finished_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn recent_games(&self, limit: usize) -> Result<Vec<GameRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT score, rounds, correct, wrong, timeouts, finished_at
            FROM games
            ORDER BY finished_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let finished_at: String = row.get(5)?;
            let finished_at = DateTime::parse_from_rfc3339(&finished_at)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        5,
                        "finished_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(GameRecord {
                score: row.get(0)?,
                rounds: row.get(1)?,
                correct: row.get(2)?,
                wrong: row.get(3)?,
                timeouts: row.get(4)?,
                finished_at,
            })
        })?;

        let mut games = Vec::new();
        for game in rows {
            games.push(game?);
        }
        Ok(games)
    }
}

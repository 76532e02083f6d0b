pub mod models;

#[cfg(test)]
mod tests;

use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::AppError;

pub use models::*;

fn open_connection(db_path: &Path) -> Result<Connection, AppError> {
    let conn = Connection::open(db_path).map_err(|e| AppError::StorageOpen(e.to_string()))?;

    // WAL keeps readers (library listing) from blocking behind writes
    conn.execute_batch(
        "
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;
    ",
    )
    .map_err(|e| AppError::StorageOpen(e.to_string()))?;

    Ok(conn)
}

// =========================================================================
// ContentStore
// =========================================================================

/// Durable store for imported media payloads. Append-only: rows are never
/// updated or deleted, and ids are assigned by sqlite at insert time.
///
/// `open` is idempotent (schema creation is `IF NOT EXISTS`) and the handle
/// is cheap to clone; clones share one logical store.
#[derive(Clone)]
pub struct ContentStore {
    conn: Arc<Mutex<Connection>>,
}

impl ContentStore {
    pub fn open(db_path: &Path) -> Result<Self, AppError> {
        let conn = open_connection(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS podcasts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                content BLOB NOT NULL,
                added_date TEXT NOT NULL DEFAULT (datetime('now'))
            );
        ",
        )
        .map_err(|e| AppError::StorageOpen(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Persist a payload and return its assigned metadata. The insert is a
    /// single statement, so a failure leaves no partial record visible.
    pub fn add(&self, name: &str, content: &[u8]) -> Result<PodcastMetadata, AppError> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO podcasts (name, content, added_date) VALUES (?, ?, ?)",
            params![name, content, now],
        )
        .map_err(|e| AppError::StorageWrite(e.to_string()))?;
        let id = conn.last_insert_rowid();

        Ok(PodcastMetadata {
            id,
            name: name.to_string(),
        })
    }

    /// All stored podcasts, ascending by id (insertion order).
    pub fn list(&self) -> Result<Vec<PodcastMetadata>, AppError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, name FROM podcasts ORDER BY id ASC")
            .map_err(|e| AppError::StorageRead(e.to_string()))?;
        let podcasts = stmt
            .query_map([], |row| {
                Ok(PodcastMetadata {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(|e| AppError::StorageRead(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::StorageRead(e.to_string()))?;

        Ok(podcasts)
    }

    /// The stored payload, or `None` for an unknown id.
    pub fn get_content(&self, id: i64) -> Result<Option<Vec<u8>>, AppError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT content FROM podcasts WHERE id = ?",
            params![id],
            |row| row.get(0),
        );
        match result {
            Ok(content) => Ok(Some(content)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::StorageRead(e.to_string())),
        }
    }

    pub fn count(&self) -> Result<i64, AppError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM podcasts", [], |row| row.get(0))
            .map_err(|e| AppError::StorageRead(e.to_string()))
    }
}

// =========================================================================
// ProgressStore
// =========================================================================

/// Durable key-value store for per-podcast resume positions. Lives in its
/// own database file: these are frequent small writes that must not queue
/// behind multi-megabyte payload inserts.
#[derive(Clone)]
pub struct ProgressStore {
    conn: Arc<Mutex<Connection>>,
}

fn progress_key(podcast_id: i64) -> String {
    format!("progress:{}", podcast_id)
}

impl ProgressStore {
    pub fn open(db_path: &Path) -> Result<Self, AppError> {
        let conn = open_connection(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS playback_progress (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
        ",
        )
        .map_err(|e| AppError::StorageOpen(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Saved progress for a podcast, `{0, 0}` when none was ever written.
    /// Stored values are validated before they are trusted: malformed JSON
    /// or an invariant-violating record reads back as the default.
    pub fn get(&self, podcast_id: i64) -> Result<PlaybackProgress, AppError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT value FROM playback_progress WHERE key = ?",
            params![progress_key(podcast_id)],
            |row| row.get::<_, String>(0),
        );
        let raw = match result {
            Ok(value) => value,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(PlaybackProgress::default()),
            Err(e) => return Err(AppError::StorageRead(e.to_string())),
        };

        match serde_json::from_str::<PlaybackProgress>(&raw) {
            Ok(progress) if progress.is_valid() => Ok(progress),
            Ok(_) | Err(_) => {
                log::warn!(
                    "Discarding malformed progress record for podcast {}",
                    podcast_id
                );
                Ok(PlaybackProgress::default())
            }
        }
    }

    /// Upsert the progress record for a podcast. Write-through: every call
    /// hits the database.
    pub fn set(
        &self,
        podcast_id: i64,
        current_position: f64,
        total_duration: f64,
    ) -> Result<(), AppError> {
        let progress = PlaybackProgress {
            current_position,
            total_duration,
        };
        let value =
            serde_json::to_string(&progress).map_err(|e| AppError::StorageWrite(e.to_string()))?;

        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT OR REPLACE INTO playback_progress (key, value, updated_at) VALUES (?, ?, ?)",
            params![progress_key(podcast_id), value, now],
        )
        .map_err(|e| AppError::StorageWrite(e.to_string()))?;

        Ok(())
    }
}

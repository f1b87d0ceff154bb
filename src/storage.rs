//! SQLite storage for annotated sequences
//!
//! Uses WAL mode for concurrent access. Each sequence is one row holding
//! its units as JSON, so reorders and description edits rewrite the row.

use crate::chunk::ChunkUnit;
use crate::error::{Error, Result};
use crate::store::Store;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS diffs (
    id TEXT PRIMARY KEY,
    diff TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_updated ON diffs(updated_at);
"#;

/// Summary row for listing stored sequences
#[derive(Debug, Clone)]
pub struct StoredDiff {
    pub id: String,
    pub chunk_count: usize,
    pub created_at: i64,
    pub updated_at: i64,
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Default database location: `<config dir>/literate-diff/diffs.db`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "could not determine config directory",
                ))
            })?
            .join("literate-diff");
        Ok(config_dir.join("diffs.db"))
    }

    /// Opens or creates the database at the specified path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(std::time::Duration::from_secs(30))?;

        conn.execute_batch(SCHEMA)?;
        debug!("opened diff store at {}", path.display());

        Ok(Self { conn })
    }

    /// Stored sequences, most recently updated first
    pub fn list(&self) -> Result<Vec<StoredDiff>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, diff, created_at, updated_at FROM diffs ORDER BY updated_at DESC, id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, diff, created_at, updated_at)| -> Result<StoredDiff> {
                let units: Vec<ChunkUnit> = serde_json::from_str(&diff)?;
                Ok(StoredDiff {
                    id,
                    chunk_count: units.len(),
                    created_at,
                    updated_at,
                })
            })
            .collect()
    }
}

/// Current unix time in seconds, as stored in `created_at`/`updated_at`
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

impl Store for SqliteStore {
    fn create(&mut self, diff: &[ChunkUnit]) -> Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let body = serde_json::to_string(diff)?;
        let now = now_secs();

        self.conn.execute(
            "INSERT INTO diffs (id, diff, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![id, body, now],
        )?;

        debug!("created diff {} with {} chunks", id, diff.len());
        Ok(id)
    }

    fn update(&mut self, id: &str, diff: &[ChunkUnit]) -> Result<()> {
        let body = serde_json::to_string(diff)?;

        let count = self.conn.execute(
            "UPDATE diffs SET diff = ?1, updated_at = ?2 WHERE id = ?3",
            params![body, now_secs(), id],
        )?;
        if count == 0 {
            return Err(Error::UnknownId(id.to_string()));
        }

        debug!("updated diff {} with {} chunks", id, diff.len());
        Ok(())
    }

    fn load(&mut self, id: &str) -> Result<Vec<ChunkUnit>> {
        let body: Option<String> = self
            .conn
            .query_row("SELECT diff FROM diffs WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;

        let body = body.ok_or_else(|| Error::UnknownId(id.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::expand;
    use crate::diff::parse;
    use tempfile::tempdir;

    const DIFF: &str = "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\n@@ -9 +9 @@\n-c\n+d\n";

    #[test]
    fn test_create_and_load() {
        let dir = tempdir().unwrap();
        let mut storage = SqliteStore::open(&dir.path().join("test.db")).unwrap();

        let mut units = expand(parse(DIFF));
        units[1].description = "second hunk".into();

        let id = storage.create(&units).unwrap();
        assert_eq!(id.len(), 32);

        let loaded = storage.load(&id).unwrap();
        assert_eq!(loaded, units);
    }

    #[test]
    fn test_update_overwrites() {
        let dir = tempdir().unwrap();
        let mut storage = SqliteStore::open(&dir.path().join("test.db")).unwrap();

        let mut units = expand(parse(DIFF));
        let id = storage.create(&units).unwrap();

        units.swap(0, 1);
        storage.update(&id, &units).unwrap();

        let loaded = storage.load(&id).unwrap();
        assert_eq!(loaded[0].chunk_index, 1);
        assert_eq!(loaded[1].chunk_index, 0);
    }

    #[test]
    fn test_unknown_id() {
        let dir = tempdir().unwrap();
        let mut storage = SqliteStore::open(&dir.path().join("test.db")).unwrap();

        assert!(matches!(storage.load("missing"), Err(Error::UnknownId(_))));
        assert!(matches!(
            storage.update("missing", &[]),
            Err(Error::UnknownId(_))
        ));
    }

    #[test]
    fn test_corrupt_record() {
        let dir = tempdir().unwrap();
        let mut storage = SqliteStore::open(&dir.path().join("test.db")).unwrap();
        let id = storage.create(&expand(parse(DIFF))).unwrap();

        storage
            .conn
            .execute("UPDATE diffs SET diff = 'garbage' WHERE id = ?1", params![id])
            .unwrap();

        let err = storage.load(&id).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_transport());
    }

    #[test]
    fn test_list_and_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("test.db");

        let id = {
            let mut storage = SqliteStore::open(&db_path).unwrap();
            storage.create(&expand(parse(DIFF))).unwrap()
        };

        let storage = SqliteStore::open(&db_path).unwrap();
        let listed = storage.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].chunk_count, 2);
        assert!(listed[0].created_at <= listed[0].updated_at);
        assert!(listed[0].updated_at <= now_secs());
    }
}

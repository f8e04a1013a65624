//! `SQLite`-based document store.
//!
//! All collections share one `documents` table keyed by
//! `(collection, key)`; each row holds the JSON body of one record.

use super::{record_key, Collection, DocumentStore, WriteBatch, WriteOp};
use crate::error::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// SQLite-based document store.
///
/// Each operation opens a new connection to the database file. This keeps
/// the store free of shared connection state and is cheap enough for the
/// request/response usage of the repositories.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    /// Path to the database file.
    db_path: PathBuf,
}

impl SqliteStore {
    /// Create a new `SQLite` store at the given database path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendUnavailable`] if the database cannot be opened,
    /// or a database error if the schema cannot be created.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let store = Self { db_path: db_path.as_ref().to_path_buf() };
        store.init_schema()?;
        tracing::debug!(path = %store.db_path.display(), "sqlite store ready");
        Ok(store)
    }

    /// Get the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection to the database.
    fn open(&self) -> Result<Connection> {
        let unavailable =
            |e: String| Error::BackendUnavailable(format!("{}: {e}", self.db_path.display()));

        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| unavailable(e.to_string()))?;
        }
        let conn = Connection::open(&self.db_path).map_err(|e| unavailable(e.to_string()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(|e| unavailable(e.to_string()))?;
        Ok(conn)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (collection, key)
            );
            ",
        )?;

        Ok(())
    }

    fn put_with(conn: &Connection, collection: Collection, record: &Value) -> Result<()> {
        let key = record_key(collection, record)?;
        let body = serde_json::to_string(record)?;
        conn.execute(
            "INSERT INTO documents (collection, key, body) VALUES (?1, ?2, ?3)
             ON CONFLICT(collection, key)
             DO UPDATE SET body = excluded.body, updated_at = datetime('now')",
            params![collection.name(), key, body],
        )?;
        Ok(())
    }

    fn delete_with(conn: &Connection, collection: Collection, key: &str) -> Result<bool> {
        let rows = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND key = ?2",
            params![collection.name(), key],
        )?;
        Ok(rows > 0)
    }
}

impl DocumentStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn ensure_available(&self) -> Result<()> {
        let conn = self.open()?;
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get::<_, i64>(0))
            .map_err(|e| Error::BackendUnavailable(format!("{}: {e}", self.db_path.display())))?;
        Ok(())
    }

    fn get_all(&self, collection: Collection) -> Result<Vec<Value>> {
        let conn = self.open()?;
        let mut stmt =
            conn.prepare("SELECT body FROM documents WHERE collection = ?1 ORDER BY key ASC")?;
        let bodies: Vec<String> = stmt
            .query_map(params![collection.name()], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;

        bodies.iter().map(|body| serde_json::from_str(body).map_err(Error::from)).collect()
    }

    fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        let conn = self.open()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND key = ?2",
                params![collection.name(), key],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|b| serde_json::from_str(&b)).transpose().map_err(Error::from)
    }

    fn put(&self, collection: Collection, record: &Value) -> Result<()> {
        let conn = self.open()?;
        Self::put_with(&conn, collection, record)
    }

    fn delete(&self, collection: Collection, key: &str) -> Result<bool> {
        let conn = self.open()?;
        Self::delete_with(&conn, collection, key)
    }

    fn clear(&self, collection: Collection) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM documents WHERE collection = ?1", params![collection.name()])?;
        Ok(())
    }

    fn apply(&self, batch: WriteBatch) -> Result<()> {
        batch.validate()?;
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        for op in batch {
            match op {
                WriteOp::Put { collection, record } => Self::put_with(&tx, collection, &record)?,
                WriteOp::Delete { collection, key } => {
                    Self::delete_with(&tx, collection, &key)?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

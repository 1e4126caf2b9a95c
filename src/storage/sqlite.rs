// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQLite cold tier.
//!
//! One table of opaque blobs:
//! ```sql
//! CREATE TABLE cache_entries (
//!   key   BLOB PRIMARY KEY,
//!   value BLOB NOT NULL
//! )
//! ```
//!
//! The database runs in WAL journal mode with `synchronous = NORMAL`, so
//! readers never block the demotion writer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use sqlx::Row;
use tracing::{debug, info};

use super::traits::{ColdStore, StorageError};

pub struct SqliteStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    pub async fn open(
        path: impl AsRef<Path>,
        max_connections: u32,
        busy_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(path = %path.display(), max_connections, "Opening SQLite cold tier");

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to open {}: {}", path.display(), e)))?;

        let store = Self { pool, path };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                key BLOB PRIMARY KEY,
                value BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(format!("Failed to create schema: {}", e)))?;
        Ok(())
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a WAL checkpoint to fold the `-wal` file back into the database.
    pub async fn checkpoint(&self) -> Result<(), StorageError> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("WAL checkpoint failed: {}", e)))?;

        debug!(path = %self.path.display(), "WAL checkpoint completed");
        Ok(())
    }
}

#[async_trait]
impl ColdStore for SqliteStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let row = sqlx::query("SELECT value FROM cache_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get::<Vec<u8>, _>("value")?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO cache_entries (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM cache_entries")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("cnt")?;
        Ok(count as u64)
    }

    async fn close(&self) -> Result<(), StorageError> {
        let checkpoint = self.checkpoint().await;
        self.pool.close().await;
        info!(path = %self.path.display(), "SQLite cold tier closed");
        checkpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_in(dir: &TempDir) -> SqliteStore {
        SqliteStore::open(dir.path().join("cold.db"), 2, Duration::from_secs(5))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir).await;

        store.put(b"k", b"v1").await.unwrap();
        assert_eq!(store.get(b"k").await.unwrap(), Some(b"v1".to_vec()));

        store.put(b"k", b"v2").await.unwrap();
        assert_eq!(store.get(b"k").await.unwrap(), Some(b"v2".to_vec()));
        assert_eq!(store.count().await.unwrap(), 1);

        store.delete(b"k").await.unwrap();
        assert_eq!(store.get(b"k").await.unwrap(), None);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir).await;
        assert!(store.delete(b"never-written").await.is_ok());
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = TempDir::new().unwrap();

        let store = open_in(&dir).await;
        store.put(b"durable", &[0, 1, 2, 255]).await.unwrap();
        store.close().await.unwrap();

        let reopened = open_in(&dir).await;
        assert_eq!(reopened.get(b"durable").await.unwrap(), Some(vec![0, 1, 2, 255]));
        reopened.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b").join("cold.db");

        let store = SqliteStore::open(&nested, 1, Duration::from_secs(1)).await.unwrap();
        assert!(nested.exists());
        assert_eq!(store.path(), nested.as_path());
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_fails_on_directory_path() {
        let dir = TempDir::new().unwrap();
        let result = SqliteStore::open(dir.path(), 1, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(StorageError::Backend(_))));
    }
}

//! SQLite-backed local cache.
//!
//! One `kv` table; values are the JSON strings handed in by callers.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use super::LocalCache;
use crate::errors::ClientError;

/// Local cache persisted in a SQLite file.
#[derive(Clone)]
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the cache file and run migrations.
    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        Ok(Self::new(init_cache(path).await?))
    }
}

/// Initialize the cache connection pool and run migrations.
async fn init_cache(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[async_trait]
impl LocalCache for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ClientError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let cache = SqliteCache::open(&dir.path().join("cache.sqlite"))
            .await
            .unwrap();

        assert!(cache.get("user").await.unwrap().is_none());

        cache.set("user", r#"{"id":"1"}"#).await.unwrap();
        cache.set("user", r#"{"id":"2"}"#).await.unwrap();
        assert_eq!(
            cache.get("user").await.unwrap().as_deref(),
            Some(r#"{"id":"2"}"#)
        );

        cache.remove("user").await.unwrap();
        assert!(cache.get("user").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.sqlite");

        {
            let cache = SqliteCache::open(&path).await.unwrap();
            cache.set("votes:anon", r#"{"1":"up"}"#).await.unwrap();
        }

        let cache = SqliteCache::open(&path).await.unwrap();
        assert_eq!(
            cache.get("votes:anon").await.unwrap().as_deref(),
            Some(r#"{"1":"up"}"#)
        );
    }
}

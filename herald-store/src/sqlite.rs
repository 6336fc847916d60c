//! SQLite-backed [`KvStore`].
//!
//! One table, upsert on write. Concurrent writers race and the last one wins;
//! writes are rare (OAuth callback, token refresh) so nothing coordinates them.
use crate::{KvStore, StoreError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

const SCHEMA: &str = r#"CREATE TABLE IF NOT EXISTS kv_store (
    key        TEXT PRIMARY KEY NOT NULL,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#;

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect (creating the database file if needed) and ensure the schema.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // every connection to `:memory:` is its own database
        let max = if url.contains(":memory:") { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max)
            .connect_with(opts)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        info!("store.sqlite.ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query(r#"SELECT value FROM kv_store WHERE key = ?1"#)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        let value = row.map(|r| r.try_get::<String, _>("value")).transpose()?;
        debug!(key, found = value.is_some(), "store.get");
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let res = sqlx::query(
            r#"INSERT INTO kv_store (key, value, updated_at)
               VALUES (?1, ?2, ?3)
               ON CONFLICT(key) DO UPDATE SET
                 value=excluded.value,
                 updated_at=excluded.updated_at"#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        debug!(key, rows = res.rows_affected(), "store.put");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let res = sqlx::query(r#"DELETE FROM kv_store WHERE key = ?1"#)
            .bind(key)
            .execute(&self.pool)
            .await?;
        debug!(key, rows = res.rows_affected(), "store.delete");
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query(r#"DELETE FROM kv_store WHERE key = ?1 RETURNING value"#)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        let value = row.map(|r| r.try_get::<String, _>("value")).transpose()?;
        debug!(key, found = value.is_some(), "store.take");
        Ok(value)
    }
}

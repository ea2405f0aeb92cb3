//! Read cache backed by a SQLite key-value table, shareable between processes.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::ReadCache;
use crate::db::open_pool;
use crate::errors::AppError;

#[derive(Clone)]
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    /// Open the cache database at `url` and make sure the entry table exists.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let pool = open_pool(url).await.map_err(cache_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await
        .map_err(cache_error)?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl ReadCache for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM cache_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(cache_error)?;

        Ok(row.map(|r| r.get("value")))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO cache_entries (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(cache_error)?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(cache_error)?;

        Ok(result.rows_affected() > 0)
    }
}

fn cache_error(err: sqlx::Error) -> AppError {
    tracing::error!("Cache error: {:?}", err);
    AppError::Cache(format!("Cache error: {}", err))
}

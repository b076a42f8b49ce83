//! Cache entry operations

use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::models::CacheEntry;
use crate::repository::Database;
use crate::utils::to_db_timestamp;

impl Database {
    // ==================== Cache Entry Operations ====================

    /// Insert or overwrite a cache entry
    pub async fn put_cache_entry(
        &self,
        key: &str,
        value: &[u8],
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at, created_at = excluded.created_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(to_db_timestamp(&expires_at))
        .bind(to_db_timestamp(&now))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a cache entry by key, expired or not
    pub async fn get_cache_entry(&self, key: &str) -> Result<Option<CacheEntry>, DbError> {
        let row = sqlx::query(
            "SELECT key, value, expires_at, created_at FROM cache_entries WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| CacheEntry::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Delete a cache entry by key
    pub async fn delete_cache_entry(&self, key: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every entry that expired at or before `now`
    pub async fn delete_expired_cache_entries(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= ?")
            .bind(to_db_timestamp(&now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

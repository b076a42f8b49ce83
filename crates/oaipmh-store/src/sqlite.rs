//! SQLite-backed cache store

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use oaipmh_db::Database;
use std::time::Duration;
use tracing::{debug, info};

use crate::backend::{CacheStore, chrono_ttl};
use crate::error::StoreError;

/// Cache store persisted in the `cache_entries` table
///
/// Entries survive process restarts, so resumption tokens stay valid across
/// a redeploy as long as they have not expired.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Create a store on top of an opened database
    pub fn new(db: Database) -> Self {
        info!("Initialized SQLite cache store");
        Self { db }
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let entry = match self.db.get_cache_entry(key).await? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        if entry.is_expired(Utc::now()) {
            debug!("Dropping expired cache entry: {}", key);
            self.db.delete_cache_entry(key).await?;
            return Ok(None);
        }

        Ok(Some(Bytes::from(entry.value)))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Utc::now() + chrono_ttl(ttl)?;
        self.db.put_cache_entry(key, &value, expires_at).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.db.delete_cache_entry(key).await?)
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        Ok(self.db.delete_expired_cache_entries(Utc::now()).await?)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

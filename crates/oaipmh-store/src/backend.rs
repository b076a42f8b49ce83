//! Cache store trait

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::StoreError;

/// Key/value cache with per-entry time-to-live
///
/// Implementations must never return an entry whose TTL has elapsed, but
/// they are free to keep expired entries around until the next lookup or
/// `purge_expired` call. Single-key `get`/`set`/`delete` are atomic.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a live entry
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Insert or overwrite an entry that expires after `ttl`
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError>;

    /// Delete an entry, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Drop every expired entry, returning how many were removed
    async fn purge_expired(&self) -> Result<u64, StoreError>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

/// Convert a TTL into a chrono duration
pub(crate) fn chrono_ttl(ttl: Duration) -> Result<chrono::Duration, StoreError> {
    chrono::Duration::from_std(ttl).map_err(|e| StoreError::InvalidTtl(format!("{:?}: {}", ttl, e)))
}

//! Background eviction of expired cache entries

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::CacheStore;

/// Spawn a background task that purges expired entries periodically
pub fn spawn_purge_task(
    store: Arc<dyn CacheStore>,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    use tokio::time::{Duration, interval};

    info!(
        "Starting background cache purge task (backend: {}, interval: {} seconds)",
        store.name(),
        interval_secs
    );

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

        // Skip the first tick (which fires immediately)
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match store.purge_expired().await {
                Ok(0) => debug!("Cache purge: nothing expired"),
                Ok(purged) => info!("Cache purge: {} expired entries removed", purged),
                Err(e) => warn!("Error during cache purge: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use bytes::Bytes;
    use std::time::Duration;

    #[tokio::test]
    async fn test_purge_task_evicts_expired_entries() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("dead", Bytes::from_static(b"x"), Duration::ZERO)
            .await
            .unwrap();

        let handle = spawn_purge_task(store.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(store.is_empty());
        handle.abort();
    }
}

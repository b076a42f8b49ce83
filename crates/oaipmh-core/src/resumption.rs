//! Resumption-token flow control for list responses
//!
//! A list longer than the page size is cut after `page_size` items. The rest
//! is stored in the cache store under a freshly minted token, together with
//! the search that produced it. Presenting the token returns the next page;
//! once that page has been built the entry is released, and the remainder,
//! if any, moves to a new token.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use oaipmh_store::CacheStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::OaiError;
use crate::harvest::SearchParams;
use crate::verb::Verb;

const TOKEN_KEY_PREFIX: &str = "resumption:";

/// Cached backing state of a resumption token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumptionState<T> {
    /// Verb of the list the token belongs to
    pub verb: Verb,
    /// Search as originally requested
    pub params: SearchParams,
    /// Items not yet returned, in list order
    pub remaining: Vec<T>,
    /// Position of `remaining[0]` in the complete list
    pub cursor: usize,
    pub complete_list_size: usize,
    pub expires_at: DateTime<Utc>,
}

impl<T> ResumptionState<T> {
    /// The original search with the cursor advanced to this state
    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            cursor: self.cursor,
            ..self.params.clone()
        }
    }

    /// Turn the state into the window of items still to be paged
    pub fn into_window(self) -> (Window<T>, SearchParams) {
        let params = self.search_params();
        let window = Window {
            items: self.remaining,
            cursor: self.cursor,
            complete_list_size: self.complete_list_size,
            resumed: true,
        };
        (window, params)
    }
}

/// Items of a list starting at `cursor`
#[derive(Debug, Clone, PartialEq)]
pub struct Window<T> {
    pub items: Vec<T>,
    pub cursor: usize,
    pub complete_list_size: usize,
    /// Whether the window continues a list cut by an earlier response
    pub resumed: bool,
}

impl<T> Window<T> {
    /// The complete result of a new query
    pub fn fresh(items: Vec<T>) -> Self {
        let complete_list_size = items.len();
        Self {
            items,
            cursor: 0,
            complete_list_size,
            resumed: false,
        }
    }
}

/// Resumption information attached to a list response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resumption {
    /// Token for the next page; `None` on the last page of a resumed list
    pub token: Option<String>,
    /// Position of the first item of this page in the complete list
    pub cursor: usize,
    pub complete_list_size: usize,
    pub expiration_date: Option<DateTime<Utc>>,
}

/// One page of a list response
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Absent when a fresh list fits in a single page
    pub resumption: Option<Resumption>,
}

impl<T> Page<T> {
    /// Replace the items, keeping the resumption information
    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            resumption: self.resumption,
        }
    }
}

/// Mints, stores and consumes resumption tokens
pub struct ResumptionManager {
    store: Arc<dyn CacheStore>,
    page_size: usize,
    token_ttl: Duration,
}

impl ResumptionManager {
    pub fn new(store: Arc<dyn CacheStore>, page_size: usize, token_ttl: Duration) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            token_ttl,
        }
    }

    /// Cut the next page out of `window`, storing the rest under a new token
    pub async fn paginate<T: Serialize>(
        &self,
        verb: Verb,
        window: Window<T>,
        params: &SearchParams,
    ) -> Result<Page<T>, OaiError> {
        let Window {
            mut items,
            cursor,
            complete_list_size,
            resumed,
        } = window;

        if items.len() <= self.page_size {
            let resumption = resumed.then_some(Resumption {
                token: None,
                cursor,
                complete_list_size,
                expiration_date: None,
            });
            return Ok(Page { items, resumption });
        }

        let remaining = items.split_off(self.page_size);
        let token = mint_token();
        let ttl = chrono::Duration::from_std(self.token_ttl)
            .map_err(|e| OaiError::Internal(format!("Invalid token TTL: {}", e)))?;
        let expires_at = Utc::now() + ttl;

        let state = ResumptionState {
            verb,
            params: params.clone(),
            remaining,
            cursor: cursor + self.page_size,
            complete_list_size,
            expires_at,
        };
        let encoded = serde_json::to_vec(&state)
            .map_err(|e| OaiError::Internal(format!("Failed to encode resumption state: {}", e)))?;
        self.store
            .set(&cache_key(&token), Bytes::from(encoded), self.token_ttl)
            .await?;

        debug!(
            "Issued resumption token for {} ({} of {} items remaining)",
            verb,
            state.remaining.len(),
            complete_list_size
        );

        Ok(Page {
            items,
            resumption: Some(Resumption {
                token: Some(token),
                cursor,
                complete_list_size,
                expiration_date: Some(expires_at),
            }),
        })
    }

    /// Look up the state behind a token
    ///
    /// Unknown, malformed, expired and foreign-verb tokens are all reported
    /// as `badResumptionToken`. A valid entry stays in the store until
    /// [`release`](Self::release) is called, so a request that fails after
    /// the lookup can be retried with the same token.
    pub async fn lookup<T: DeserializeOwned>(
        &self,
        verb: Verb,
        token: &str,
    ) -> Result<ResumptionState<T>, OaiError> {
        if !is_well_formed(token) {
            debug!("Rejecting malformed resumption token");
            return Err(OaiError::bad_resumption_token());
        }

        let key = cache_key(token);
        let encoded = self
            .store
            .get(&key)
            .await?
            .ok_or_else(OaiError::bad_resumption_token)?;

        let state: ResumptionState<T> = match serde_json::from_slice(&encoded) {
            Ok(state) => state,
            Err(e) => {
                warn!("Discarding undecodable resumption state {}: {}", token, e);
                self.store.delete(&key).await?;
                return Err(OaiError::bad_resumption_token());
            }
        };

        if state.verb != verb {
            debug!(
                "Resumption token issued for {} presented to {}",
                state.verb, verb
            );
            return Err(OaiError::bad_resumption_token());
        }

        if state.expires_at <= Utc::now() {
            debug!("Resumption token expired at {}", state.expires_at);
            self.store.delete(&key).await?;
            return Err(OaiError::bad_resumption_token());
        }

        Ok(state)
    }

    /// Consume a token whose page has been served
    pub async fn release(&self, token: &str) -> Result<(), OaiError> {
        if self.store.delete(&cache_key(token)).await? {
            debug!("Released resumption token {}", token);
        }
        Ok(())
    }
}

fn mint_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn cache_key(token: &str) -> String {
    format!("{}{}", TOKEN_KEY_PREFIX, token)
}

/// Tokens are 32 lowercase hex characters
fn is_well_formed(token: &str) -> bool {
    token.len() == 32 && token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::MetadataFormat;
    use oaipmh_store::MemoryStore;

    fn manager(page_size: usize) -> (ResumptionManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let manager = ResumptionManager::new(store.clone(), page_size, Duration::from_secs(600));
        (manager, store)
    }

    fn params() -> SearchParams {
        SearchParams {
            metadata_format: Some(MetadataFormat::OaiDc),
            set: Some("physics".to_string()),
            ..Default::default()
        }
    }

    fn numbers(n: u32) -> Vec<u32> {
        (0..n).collect()
    }

    #[tokio::test]
    async fn test_list_of_exactly_page_size_has_no_token() {
        let (manager, store) = manager(5);
        let page = manager
            .paginate(Verb::ListRecords, Window::fresh(numbers(5)), &params())
            .await
            .unwrap();
        assert_eq!(page.items, numbers(5));
        assert!(page.resumption.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_truncated_list_round_trip() {
        let (manager, store) = manager(5);
        let page = manager
            .paginate(Verb::ListRecords, Window::fresh(numbers(12)), &params())
            .await
            .unwrap();
        assert_eq!(page.items, vec![0, 1, 2, 3, 4]);
        let first = page.resumption.unwrap();
        assert_eq!(first.cursor, 0);
        assert_eq!(first.complete_list_size, 12);
        assert!(first.expiration_date.is_some());
        let token = first.token.unwrap();
        assert!(is_well_formed(&token));

        // Second page
        let state: ResumptionState<u32> =
            manager.lookup(Verb::ListRecords, &token).await.unwrap();
        assert_eq!(state.search_params().cursor, 5);
        assert_eq!(state.search_params().set.as_deref(), Some("physics"));
        let (window, params) = state.into_window();
        let page = manager
            .paginate(Verb::ListRecords, window, &params)
            .await
            .unwrap();
        assert_eq!(page.items, vec![5, 6, 7, 8, 9]);
        let second = page.resumption.unwrap();
        assert_eq!(second.cursor, 5);
        let next = second.token.unwrap();
        assert_ne!(next, token);

        // The served token is kept until released, then only the new one remains
        assert_eq!(store.len(), 2);
        manager.release(&token).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(matches!(
            manager.lookup::<u32>(Verb::ListRecords, &token).await,
            Err(OaiError::BadResumptionToken(_))
        ));

        // Last page: no new token, final position reported
        let (window, params) = manager
            .lookup::<u32>(Verb::ListRecords, &next)
            .await
            .unwrap()
            .into_window();
        let page = manager
            .paginate(Verb::ListRecords, window, &params)
            .await
            .unwrap();
        manager.release(&next).await.unwrap();
        assert_eq!(page.items, vec![10, 11]);
        assert_eq!(
            page.resumption,
            Some(Resumption {
                token: None,
                cursor: 10,
                complete_list_size: 12,
                expiration_date: None,
            })
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_independent_searches_get_distinct_tokens() {
        let (manager, _store) = manager(2);
        let a = manager
            .paginate(Verb::ListSets, Window::fresh(numbers(3)), &params())
            .await
            .unwrap();
        let b = manager
            .paginate(Verb::ListSets, Window::fresh(numbers(3)), &params())
            .await
            .unwrap();
        assert_eq!(a.items, b.items);
        assert_ne!(
            a.resumption.unwrap().token,
            b.resumption.unwrap().token
        );
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_tokens() {
        let (manager, _store) = manager(2);
        for token in ["abc123", "", "0123456789ABCDEF0123456789ABCDEF"] {
            assert!(matches!(
                manager.lookup::<u32>(Verb::ListIdentifiers, token).await,
                Err(OaiError::BadResumptionToken(_))
            ));
        }
        let never_issued = mint_token();
        assert!(matches!(
            manager.lookup::<u32>(Verb::ListIdentifiers, &never_issued).await,
            Err(OaiError::BadResumptionToken(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let store = Arc::new(MemoryStore::new());
        let manager = ResumptionManager::new(store.clone(), 1, Duration::ZERO);
        let page = manager
            .paginate(Verb::ListRecords, Window::fresh(numbers(3)), &params())
            .await
            .unwrap();
        let token = page.resumption.unwrap().token.unwrap();
        assert!(matches!(
            manager.lookup::<u32>(Verb::ListRecords, &token).await,
            Err(OaiError::BadResumptionToken(_))
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_keeps_token_until_released() {
        let (manager, store) = manager(1);
        let page = manager
            .paginate(Verb::ListSets, Window::fresh(numbers(3)), &params())
            .await
            .unwrap();
        let token = page.resumption.unwrap().token.unwrap();

        for _ in 0..2 {
            let state: ResumptionState<u32> =
                manager.lookup(Verb::ListSets, &token).await.unwrap();
            assert_eq!(state.cursor, 1);
        }

        manager.release(&token).await.unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            manager.lookup::<u32>(Verb::ListSets, &token).await,
            Err(OaiError::BadResumptionToken(_))
        ));
    }

    #[tokio::test]
    async fn test_token_is_bound_to_its_verb() {
        let (manager, store) = manager(1);
        let page = manager
            .paginate(Verb::ListRecords, Window::fresh(numbers(3)), &params())
            .await
            .unwrap();
        let token = page.resumption.unwrap().token.unwrap();

        assert!(matches!(
            manager.lookup::<u32>(Verb::ListIdentifiers, &token).await,
            Err(OaiError::BadResumptionToken(_))
        ));
        // A foreign-verb lookup leaves the token usable
        assert_eq!(store.len(), 1);
        assert!(manager.lookup::<u32>(Verb::ListRecords, &token).await.is_ok());
    }

    #[tokio::test]
    async fn test_undecodable_state_is_bad_token() {
        let (manager, store) = manager(1);
        let token = mint_token();
        store
            .set(
                &cache_key(&token),
                Bytes::from_static(b"not json"),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        assert!(matches!(
            manager.lookup::<u32>(Verb::ListSets, &token).await,
            Err(OaiError::BadResumptionToken(_))
        ));
        assert!(store.is_empty());
    }
}

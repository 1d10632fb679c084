//! Page cache keyed by `(user_id, folder, page)` (§4.3). Invalidation scans
//! keys non-blockingly and deletes in chunks of 100; a pattern-wide delete
//! is forbidden because moka has no native "delete matching" primitive and
//! a full scan-and-delete sweep would stall other readers.
use std::time::Duration;

use moka::future::Cache;

use crate::{config::cfg, provider::ListPage};

const INVALIDATION_CHUNK_SIZE: usize = 100;

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct ListCacheKey {
    pub user_id: i32,
    pub folder: String,
    pub page: u32,
}

pub struct ListCache {
    inner: Cache<ListCacheKey, ListPage>,
}

impl ListCache {
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(20_000)
                .time_to_live(Duration::from_secs(cfg.cache.list_ttl_secs))
                .build(),
        }
    }

    pub async fn get(&self, key: &ListCacheKey) -> Option<ListPage> {
        self.inner.get(key).await
    }

    pub async fn set(&self, key: ListCacheKey, page: ListPage) {
        self.inner.insert(key, page).await;
    }

    /// Invalidates every cached page for a user. Walks the cache's key
    /// iterator (non-blocking) and releases control between chunks so a
    /// large invalidation doesn't monopolize the executor.
    pub async fn invalidate_user(&self, user_id: i32) {
        let matching: Vec<ListCacheKey> = self
            .inner
            .iter()
            .filter(|(k, _)| k.user_id == user_id)
            .map(|(k, _)| (*k).clone())
            .collect();

        for chunk in matching.chunks(INVALIDATION_CHUNK_SIZE) {
            for key in chunk {
                self.inner.invalidate(key).await;
            }
            tokio::task::yield_now().await;
        }
    }
}

impl Default for ListCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize) -> ListPage {
        ListPage { messages: vec![], next_page_token: Some(n.to_string()) }
    }

    #[tokio::test]
    async fn invalidate_user_clears_only_that_users_pages() {
        let cache = ListCache::new();
        cache
            .set(ListCacheKey { user_id: 1, folder: "inbox".into(), page: 0 }, page(1))
            .await;
        cache
            .set(ListCacheKey { user_id: 2, folder: "inbox".into(), page: 0 }, page(2))
            .await;

        cache.invalidate_user(1).await;

        assert!(cache.get(&ListCacheKey { user_id: 1, folder: "inbox".into(), page: 0 }).await.is_none());
        assert!(cache.get(&ListCacheKey { user_id: 2, folder: "inbox".into(), page: 0 }).await.is_some());
    }
}

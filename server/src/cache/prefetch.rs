//! Background prefetch fibres (§4.3): warm bodies for a batch of message
//! ids under a caller-supplied concurrency width, and fetch the next list
//! page into the cache if it isn't already resolved.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{stream::FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::provider::{ListQuery, MailProvider};

use super::{
    list_cache::{ListCache, ListCacheKey},
    CacheCore,
};

/// Warms tier 1/2 for `email_ids` concurrently, `width` requests in flight
/// at a time. Fetch failures are swallowed — prefetch is best-effort and
/// never surfaces an error to its caller.
pub async fn warm_bodies(
    cache: Arc<CacheCore>,
    provider: Arc<dyn MailProvider>,
    access_token: String,
    connection_id: i32,
    entries: Vec<(i32, String, DateTime<Utc>)>,
    width: usize,
) {
    let semaphore = Arc::new(Semaphore::new(width.max(1)));
    let mut tasks = FuturesUnordered::new();

    for (email_id, external_id, received_at) in entries {
        let cache = cache.clone();
        let provider = provider.clone();
        let access_token = access_token.clone();
        let semaphore = semaphore.clone();
        tasks.push(async move {
            let Ok(_permit) = semaphore.acquire().await else { return };
            let _ = cache
                .get_body(email_id, connection_id, &external_id, received_at, provider.as_ref(), &access_token)
                .await;
        });
    }

    while tasks.next().await.is_some() {}
}

/// Fetches the next list page into `list_cache` if `key` isn't already
/// resolved there.
pub async fn prefetch_next_page(
    list_cache: &ListCache,
    provider: &dyn MailProvider,
    access_token: &str,
    key: ListCacheKey,
    query: ListQuery,
) {
    if list_cache.get(&key).await.is_some() {
        return;
    }
    if let Ok(page) = provider.list_messages(access_token, &query).await {
        list_cache.set(key, page).await;
    }
}

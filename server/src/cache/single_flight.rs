//! Single-flight de-duplication guard (§4.3). New code, generalized from the
//! teacher's `once_cell::sync::Lazy` static-singleton idiom into a sharded
//! per-key guard: concurrent callers for the same key share one in-flight
//! computation instead of each issuing their own.
use std::{future::Future, hash::Hash, sync::Arc};

use dashmap::DashMap;
use tokio::sync::OnceCell;

pub struct SingleFlight<K, V> {
    inflight: DashMap<K, Arc<OnceCell<V>>>,
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self { inflight: DashMap::new() }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` at most once per overlapping window for `key`. Followers that
    /// arrive while a leader's future is in flight await the same result
    /// instead of invoking `f` themselves.
    pub async fn run<F, Fut>(&self, key: K, f: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let result = cell.get_or_init(f).await.clone();
        self.inflight.remove_if(&key, |_, v| Arc::ptr_eq(v, &cell));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn concurrent_callers_share_one_computation() {
        let flight: Arc<SingleFlight<&'static str, u32>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let flight = flight.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .run("k", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        42
                    })
                    .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sequential_calls_recompute() {
        let flight: SingleFlight<&'static str, u32> = SingleFlight::new();
        let calls = AtomicU32::new(0);

        let a = flight.run("k", || async { calls.fetch_add(1, Ordering::SeqCst) + 1 }).await;
        let b = flight.run("k", || async { calls.fetch_add(1, Ordering::SeqCst) + 1 }).await;

        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }
}

//! Write-once memo tables for lookups and decoded tiles.
//!
//! Archived runs never change after publication, so entries are never
//! evicted or invalidated. Each key owns at most one in-flight load: the
//! first miss starts it, concurrent misses on the same key await the same
//! shared future and observe the same result, and unrelated keys never
//! contend. A failed load removes its slot so the next request retries from
//! scratch.

use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Requests answered from a stored value.
    pub hits: u64,
    /// Requests that found no stored value.
    pub misses: u64,
    /// External loads actually started.
    pub loads: u64,
    /// Stored values.
    pub entries: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
}

type SharedLoad<V> = Shared<BoxFuture<'static, Result<V>>>;

enum Slot<V> {
    Ready(V),
    Loading(SharedLoad<V>),
}

/// Unbounded, coalescing memo from `K` to `V`.
pub struct Memo<K, V> {
    name: &'static str,
    slots: Arc<DashMap<K, Slot<V>>>,
    counters: Arc<Counters>,
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty memo. `name` labels logs and metrics.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Arc::new(DashMap::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Return the stored value for `key` without loading.
    pub fn get(&self, key: &K) -> Option<V> {
        self.slots.get(key).and_then(|slot| match slot.value() {
            Slot::Ready(value) => Some(value.clone()),
            Slot::Loading(_) => None,
        })
    }

    /// Return the value for `key`, running `load` at most once at a time per key.
    ///
    /// Concurrent callers share the in-flight load and all receive its
    /// result, success or error. The load is driven by its own task: if every
    /// caller is dropped mid-flight it still completes and fills the slot.
    pub async fn get_or_load<F, Fut>(&self, key: K, load: F) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let pending = match self.slots.entry(key.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                Slot::Ready(value) => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!("hrrr_cache_hits_total", "cache" => self.name).increment(1);
                    return Ok(value.clone());
                }
                Slot::Loading(pending) => {
                    self.record_miss();
                    pending.clone()
                }
            },
            Entry::Vacant(entry) => {
                self.record_miss();
                let pending = self.start_load(key, load);
                entry.insert(Slot::Loading(pending.clone()));
                tokio::spawn(pending.clone());
                pending
            }
        };

        pending.await
    }

    fn record_miss(&self) {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("hrrr_cache_misses_total", "cache" => self.name).increment(1);
    }

    /// Build the shared load future for `key`. It settles the slot itself:
    /// success stores the value, failure removes the slot.
    fn start_load<F, Fut>(&self, key: K, load: F) -> SharedLoad<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        let counters = Arc::clone(&self.counters);
        let name = self.name;

        async move {
            counters.loads.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("hrrr_cache_loads_total", "cache" => name).increment(1);
            debug!(cache = name, "Loading entry");

            let result = load().await;
            match &result {
                Ok(value) => {
                    slots.insert(key, Slot::Ready(value.clone()));
                }
                Err(e) => {
                    debug!(cache = name, error = %e, "Load failed");
                    slots.remove_if(&key, |_, slot| matches!(slot, Slot::Loading(_)));
                }
            }
            result
        }
        .boxed()
        .shared()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Ready(_)))
            .count()
    }

    /// Check if no value is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HrrrError;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn test_hit_after_load() {
        let memo: Memo<u32, Arc<String>> = Memo::new("test");
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let v = memo
                .get_or_load(7, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new("seven".to_string()))
                })
                .await
                .unwrap();
            assert_eq!(v.as_str(), "seven");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = memo.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let memo: Memo<u32, u32> = Memo::new("test");

        let err = memo
            .get_or_load(1, || async { Err(HrrrError::transient("reset")) })
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(memo.get(&1).is_none());
        assert!(memo.is_empty());

        let v = memo.get_or_load(1, || async { Ok(42) }).await.unwrap();
        assert_eq!(v, 42);
        assert_eq!(memo.get(&1), Some(42));
    }

    #[tokio::test]
    async fn test_concurrent_misses_are_coalesced() {
        let memo: Arc<Memo<&'static str, u64>> = Arc::new(Memo::new("test"));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let memo = Arc::clone(&memo);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                memo.get_or_load("k", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(99)
                })
                .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 99);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_share_one_load() {
        let memo: Arc<Memo<&'static str, u64>> = Arc::new(Memo::new("test"));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let memo = Arc::clone(&memo);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                memo.get_or_load("k", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Err(HrrrError::transient("timeout"))
                })
                .await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().unwrap_err().is_retryable());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(memo.is_empty());

        // The failed slot is gone; a new request loads again.
        let v = memo.get_or_load("k", || async { Ok(1) }).await.unwrap();
        assert_eq!(v, 1);
        assert_eq!(memo.stats().loads, 2);
    }

    #[tokio::test]
    async fn test_abandoned_load_still_populates() {
        let memo: Memo<u8, u8> = Memo::new("test");

        let pending = memo.get_or_load(3, || async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(5)
        });
        // Give up on the request after it has started.
        let _ = tokio::time::timeout(Duration::from_millis(1), pending).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(memo.get(&3), Some(5));
    }

    #[tokio::test]
    async fn test_distinct_keys_load_independently() {
        let memo: Memo<u8, u8> = Memo::new("test");
        memo.get_or_load(1, || async { Ok(10) }).await.unwrap();
        memo.get_or_load(2, || async { Ok(20) }).await.unwrap();
        assert_eq!(memo.stats().loads, 2);
        assert_eq!(memo.len(), 2);
    }
}

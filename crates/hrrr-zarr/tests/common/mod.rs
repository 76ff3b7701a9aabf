//! Shared fixtures for hrrr-zarr integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use hrrr_zarr::{
    ArchiveConfig, ArchiveStore, BloscDecompressor, ChunkResolver, HrrrError, PointSeries,
    StorageKey, TileFetcher, TileSource,
};

/// Tile source wrapping an `ArchiveStore` that counts reads per key and can
/// delay or fail them.
pub struct CountingSource {
    inner: ArchiveStore,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    delays: Mutex<HashMap<String, Duration>>,
    failures_left: AtomicUsize,
}

impl CountingSource {
    pub async fn with_objects(objects: Vec<(StorageKey, Bytes)>) -> Arc<Self> {
        let objects = objects
            .into_iter()
            .map(|(key, bytes)| (key.to_string(), bytes))
            .collect();
        let memory = test_utils::archive_with(objects).await;

        Arc::new(Self {
            inner: ArchiveStore::from_store(memory, "hrrrzarr"),
            calls: Mutex::new(HashMap::new()),
            total: AtomicUsize::new(0),
            delays: Mutex::new(HashMap::new()),
            failures_left: AtomicUsize::new(0),
        })
    }

    /// Delay every read of `key` by `delay`.
    pub fn delay(&self, key: &StorageKey, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(key.to_string(), delay);
    }

    /// Fail the next `n` reads with a transient error.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, key: &StorageKey) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(key.as_str())
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl TileSource for CountingSource {
    async fn get(&self, key: &StorageKey) -> hrrr_zarr::Result<Bytes> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_insert(0) += 1;

        let delay = self.delays.lock().unwrap().get(key.as_str()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(HrrrError::transient("connection reset by peer"));
        }

        self.inner.get(key).await
    }
}

pub fn fetcher(source: Arc<CountingSource>) -> TileFetcher {
    TileFetcher::new(source, Arc::new(BloscDecompressor::new().unwrap()))
}

pub fn point_series(source: Arc<CountingSource>) -> PointSeries {
    test_utils::init_tracing();
    PointSeries::new(
        ArchiveConfig::default(),
        ChunkResolver::hrrr(),
        fetcher(source),
    )
}

//! Tile retrieval: fetch, decompress, decode, memoize.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::cache::{CacheStats, Memo};
use crate::codec::{decode_tile, Decompressor};
use crate::error::Result;
use crate::store::TileSource;
use crate::tile::DecodedTile;
use crate::types::StorageKey;

/// Fetches and decodes tiles, at most one object-store read per key.
///
/// Decoded tiles are shared: every caller asking for the same key receives
/// the same `Arc`.
pub struct TileFetcher {
    source: Arc<dyn TileSource>,
    decompressor: Arc<dyn Decompressor>,
    cache: Memo<StorageKey, Arc<DecodedTile>>,
}

impl TileFetcher {
    pub fn new(source: Arc<dyn TileSource>, decompressor: Arc<dyn Decompressor>) -> Self {
        Self {
            source,
            decompressor,
            cache: Memo::new("tiles"),
        }
    }

    /// Fetch the tile stored under `key`.
    ///
    /// Errors: `NotFound` if the object is absent, `TransientIo` on network
    /// failure, `CorruptPayload` if decompression or layout validation fails.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn fetch(&self, key: &StorageKey) -> Result<Arc<DecodedTile>> {
        let source = Arc::clone(&self.source);
        let decompressor = Arc::clone(&self.decompressor);
        let owned_key = key.clone();

        self.cache
            .get_or_load(key.clone(), move || async move {
                let compressed = source.get(&owned_key).await?;
                let raw = decompressor.decompress(&owned_key, &compressed)?;
                let tile = decode_tile(&owned_key, &raw)?;
                debug!(
                    compressed = compressed.len(),
                    decompressed = raw.len(),
                    dims = ?tile.dims(),
                    "Decoded tile"
                );
                Ok(Arc::new(tile))
            })
            .await
    }

    /// Return an already decoded tile without touching the store.
    pub fn cached(&self, key: &StorageKey) -> Option<Arc<DecodedTile>> {
        self.cache.get(key)
    }

    /// Statistics of the tile cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

//! Object storage access for archive tiles (S3 compatible).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, path::Path, ObjectStore};
use tracing::{debug, instrument};

use crate::config::ArchiveConfig;
use crate::error::{HrrrError, Result};
use crate::types::StorageKey;

/// Byte-fetch capability: get an object's bytes by key.
///
/// Implementations must report a missing object as `NotFound` and every
/// other failure as `TransientIo`.
#[async_trait]
pub trait TileSource: Send + Sync {
    async fn get(&self, key: &StorageKey) -> Result<Bytes>;
}

/// Archive client over any `object_store` backend.
pub struct ArchiveStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ArchiveStore {
    /// Create an S3 client for the archive bucket from config.
    pub fn new(config: &ArchiveConfig) -> Result<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
            if endpoint.starts_with("http://") {
                builder = builder.with_allow_http(true);
            }
        }

        if config.anonymous {
            builder = builder.with_skip_signature(true);
        }

        let store = builder
            .build()
            .map_err(|e| HrrrError::Config(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket.clone(),
        })
    }

    /// Wrap an existing store (in-memory, local filesystem, ...).
    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl TileSource for ArchiveStore {
    #[instrument(skip(self), fields(bucket = %self.bucket, key = %key))]
    async fn get(&self, key: &StorageKey) -> Result<Bytes> {
        let location = Path::from(key.as_str());

        let bytes = self.store.get(&location).await?.bytes().await?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }
}

//! Point time series over analysis and forecast runs.

use std::sync::Arc;

use chrono::{DateTime, Duration, Timelike, Utc};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::cache::CacheStats;
use crate::codec::BloscDecompressor;
use crate::config::ArchiveConfig;
use crate::error::{HrrrError, Result};
use crate::fetch::TileFetcher;
use crate::index::ChunkResolver;
use crate::keys::{build_key, ArchiveUrls};
use crate::store::ArchiveStore;
use crate::tile::{DecodedTile, TileShape};
use crate::types::{ChunkCoordinate, ModelRun, PixelOffset, StorageKey, Variable};

/// Combined cache statistics of a [`PointSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub chunk_index: CacheStats,
    pub tiles: CacheStats,
}

/// Answers "values of variable V at (lat, lng) over time".
pub struct PointSeries {
    config: ArchiveConfig,
    resolver: ChunkResolver,
    fetcher: TileFetcher,
    urls: ArchiveUrls,
}

impl PointSeries {
    /// Compose a façade from explicit collaborators.
    pub fn new(config: ArchiveConfig, resolver: ChunkResolver, fetcher: TileFetcher) -> Self {
        let urls = ArchiveUrls::from_config(&config);
        Self {
            config,
            resolver,
            fetcher,
            urls,
        }
    }

    /// Build a façade reading the configured S3 archive.
    pub fn from_config(config: ArchiveConfig) -> Result<Self> {
        config.validate()?;

        let store = ArchiveStore::new(&config)?;
        let fetcher = TileFetcher::new(Arc::new(store), Arc::new(BloscDecompressor::new()?));
        let resolver = ChunkResolver::hrrr().with_strict_coordinates(config.strict_coordinates);

        info!(
            bucket = %config.bucket,
            region = %config.region,
            run_level = %config.run_level,
            "Archive client ready"
        );

        Ok(Self::new(config, resolver, fetcher))
    }

    /// Chunk and in-chunk offset covering (lat, lng).
    pub async fn resolve(&self, lat: f64, lng: f64) -> Result<ChunkCoordinate> {
        self.resolver.resolve(lat, lng).await
    }

    /// Storage key of one tile.
    pub fn build_key(
        &self,
        run: &ModelRun,
        variable: &Variable,
        chunk: &ChunkCoordinate,
    ) -> StorageKey {
        build_key(run, variable, chunk)
    }

    /// URL variants for keys and runs.
    pub fn urls(&self) -> &ArchiveUrls {
        &self.urls
    }

    /// One analysis value per whole hour in `[start, end)`, in chronological order.
    #[instrument(skip(self, variable), fields(variable = %variable))]
    pub async fn fetch_analysis_series(
        &self,
        variable: &Variable,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        lat: f64,
        lng: f64,
    ) -> Result<Vec<f32>> {
        let chunk = self.resolver.resolve(lat, lng).await?;
        let offset = chunk.in_chunk_offset();

        let keys: Vec<StorageKey> = (0..analysis_hours(start, end))
            .map(|hour| {
                let run = ModelRun::analysis(start + Duration::hours(hour), &self.config.run_level);
                build_key(&run, variable, &chunk)
            })
            .collect();

        // `buffered` yields in input order regardless of completion order.
        stream_in_order(keys, self.config.max_concurrent_fetches, |key| async move {
            let tile = self.fetcher.fetch(&key).await?;
            analysis_value(&key, &tile, offset)
        })
        .await
    }

    /// One value per forecast hour of the run issued at `issue_time`.
    #[instrument(skip(self, variable), fields(variable = %variable))]
    pub async fn fetch_forecast_series(
        &self,
        variable: &Variable,
        issue_time: DateTime<Utc>,
        lat: f64,
        lng: f64,
    ) -> Result<Vec<f32>> {
        let chunk = self.resolver.resolve(lat, lng).await?;
        let run = ModelRun::forecast(issue_time, &self.config.run_level);
        let key = build_key(&run, variable, &chunk);

        let tile = self.fetcher.fetch(&key).await?;
        let horizon = self.config.forecast_horizon(run.issue_time().hour());

        forecast_values(&key, &tile, chunk.in_chunk_offset(), horizon)
    }

    /// Combined cache statistics.
    pub fn stats(&self) -> SeriesStats {
        SeriesStats {
            chunk_index: self.resolver.cache_stats(),
            tiles: self.fetcher.cache_stats(),
        }
    }
}

/// Whole hours in `[start, end)`; partial hours are dropped.
pub fn analysis_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_hours().max(0)
}

async fn stream_in_order<F, Fut>(keys: Vec<StorageKey>, limit: usize, f: F) -> Result<Vec<f32>>
where
    F: FnMut(StorageKey) -> Fut,
    Fut: std::future::Future<Output = Result<f32>>,
{
    futures::stream::iter(keys)
        .map(f)
        .buffered(limit.max(1))
        .try_collect()
        .await
}

fn analysis_value(key: &StorageKey, tile: &DecodedTile, offset: PixelOffset) -> Result<f32> {
    if tile.shape() != TileShape::Snapshot {
        return Err(HrrrError::corrupt(
            key.as_str(),
            format!("expected a 150x150 analysis tile, got {:?}", tile.dims()),
        ));
    }
    tile.value_at(0, offset).ok_or_else(|| {
        HrrrError::corrupt(
            key.as_str(),
            format!("pixel ({}, {}) outside tile", offset.row, offset.col),
        )
    })
}

fn forecast_values(
    key: &StorageKey,
    tile: &DecodedTile,
    offset: PixelOffset,
    horizon: usize,
) -> Result<Vec<f32>> {
    let mut series = tile.pixel_series(offset).ok_or_else(|| {
        HrrrError::corrupt(
            key.as_str(),
            format!("pixel ({}, {}) outside tile", offset.row, offset.col),
        )
    })?;

    if series.len() < horizon {
        warn!(
            key = %key,
            hours = series.len(),
            horizon,
            "Forecast tile shorter than run horizon"
        );
    }
    series.truncate(horizon);
    Ok(series)
}

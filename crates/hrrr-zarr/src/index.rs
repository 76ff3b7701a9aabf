//! Coordinate → chunk resolution.
//!
//! A point is projected into the HRRR Lambert conformal plane and handed to a
//! [`ChunkIndex`], which names the chunk holding the nearest grid point and
//! the pixel offset inside it. Results are memoized per coordinate.

use std::sync::Arc;

use async_trait::async_trait;
use projection::LambertConformal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::cache::{CacheStats, Memo};
use crate::error::{HrrrError, Result};
use crate::types::{ChunkCoordinate, GeoCoordinate, CHUNK_EDGE};

/// Nearest-neighbour lookup from projected (x, y) to chunk identity.
///
/// Must answer deterministically for a given point; the resolver caches the
/// first answer forever.
#[async_trait]
pub trait ChunkIndex: Send + Sync {
    async fn nearest(&self, x: f64, y: f64) -> Result<ChunkCoordinate>;
}

/// Geometry of a regular projected grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// x of the first grid point (meters)
    pub x0: f64,
    /// y of the first grid point (meters)
    pub y0: f64,
    /// Grid spacing in X direction (meters)
    pub dx: f64,
    /// Grid spacing in Y direction (meters)
    pub dy: f64,
    /// Number of grid points in X direction
    pub nx: usize,
    /// Number of grid points in Y direction
    pub ny: usize,
}

impl GridGeometry {
    /// HRRR CONUS grid: 1799 × 1059 points at 3 km.
    pub fn hrrr() -> Self {
        Self {
            x0: -2_697_520.142522,
            y0: -1_587_306.152557,
            dx: 3000.0,
            dy: 3000.0,
            nx: 1799,
            ny: 1059,
        }
    }

    /// Grid cell (i, j) nearest to (x, y), clamped to the grid edges.
    pub fn nearest_cell(&self, x: f64, y: f64) -> (usize, usize) {
        (
            nearest_index(x, self.x0, self.dx, self.nx),
            nearest_index(y, self.y0, self.dy, self.ny),
        )
    }
}

fn nearest_index(v: f64, origin: f64, spacing: f64, count: usize) -> usize {
    let idx = ((v - origin) / spacing).round();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(count.saturating_sub(1))
    }
}

/// Chunk index computed from grid geometry.
///
/// Produces the same answers as the archive's published chunk index:
/// chunk ids are `"<j / 150>.<i / 150>"` and offsets `(j % 150, i % 150)`.
#[derive(Debug, Clone, Copy)]
pub struct GridChunkIndex {
    geometry: GridGeometry,
}

impl GridChunkIndex {
    pub fn new(geometry: GridGeometry) -> Self {
        Self { geometry }
    }

    pub fn hrrr() -> Self {
        Self::new(GridGeometry::hrrr())
    }

    fn lookup(&self, x: f64, y: f64) -> Result<ChunkCoordinate> {
        let (i, j) = self.geometry.nearest_cell(x, y);
        ChunkCoordinate::new(
            format!("{}.{}", j / CHUNK_EDGE, i / CHUNK_EDGE),
            j % CHUNK_EDGE,
            i % CHUNK_EDGE,
        )
    }
}

#[async_trait]
impl ChunkIndex for GridChunkIndex {
    async fn nearest(&self, x: f64, y: f64) -> Result<ChunkCoordinate> {
        self.lookup(x, y)
    }
}

/// Cache key: coordinates quantized to micro-degrees.
type CoordKey = (i64, i64);

fn coord_key(point: GeoCoordinate) -> CoordKey {
    (
        (point.lat * 1e6).round() as i64,
        (point.lng * 1e6).round() as i64,
    )
}

/// Resolves geographic points to chunks, at most one index lookup per point.
pub struct ChunkResolver {
    index: Arc<dyn ChunkIndex>,
    projection: LambertConformal,
    strict: bool,
    cache: Memo<CoordKey, ChunkCoordinate>,
}

impl ChunkResolver {
    /// Resolver using the HRRR projection over `index`.
    pub fn new(index: Arc<dyn ChunkIndex>) -> Self {
        Self {
            index,
            projection: LambertConformal::hrrr(),
            strict: false,
            cache: Memo::new("chunk_index"),
        }
    }

    /// Resolver backed by the HRRR grid geometry.
    pub fn hrrr() -> Self {
        Self::new(Arc::new(GridChunkIndex::hrrr()))
    }

    /// Reject lat/lng outside the geodetic range instead of resolving the
    /// nearest edge chunk.
    pub fn with_strict_coordinates(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Chunk and in-chunk offset covering (lat, lng).
    #[instrument(skip(self))]
    pub async fn resolve(&self, lat: f64, lng: f64) -> Result<ChunkCoordinate> {
        let point = GeoCoordinate::new(lat, lng);
        if self.strict && !point.is_geodetic() {
            return Err(HrrrError::InvalidCoordinate { lat, lng });
        }

        let (x, y) = self.projection.project(lat, lng);
        if !(x.is_finite() && y.is_finite()) {
            return Err(HrrrError::InvalidCoordinate { lat, lng });
        }

        let index = Arc::clone(&self.index);
        let chunk = self
            .cache
            .get_or_load(coord_key(point), move || async move {
                let chunk = index.nearest(x, y).await?;
                if !chunk.in_chunk_offset.is_in_chunk() {
                    return Err(HrrrError::corrupt(
                        chunk.chunk_id,
                        format!(
                            "chunk index returned offset ({}, {}) outside {CHUNK_EDGE}x{CHUNK_EDGE}",
                            chunk.in_chunk_offset.row, chunk.in_chunk_offset.col
                        ),
                    ));
                }
                Ok(chunk)
            })
            .await?;

        debug!(chunk_id = %chunk.chunk_id, row = chunk.in_chunk_offset.row, col = chunk.in_chunk_offset.col, "Resolved chunk");
        Ok(chunk)
    }

    /// Statistics of the coordinate cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

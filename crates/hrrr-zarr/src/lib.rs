//! Point time series from the HRRR Zarr archive.
//!
//! The archive stores every model run as Zarr arrays split into 150×150
//! pixel chunks, each chunk a Blosc-compressed object in S3. This crate
//! fetches only the chunks needed to answer a point query:
//!
//! - **Chunk resolution**: project (lat, lng) onto the HRRR Lambert grid and
//!   find the chunk and pixel holding the nearest grid point
//! - **Key construction**: deterministic object paths for run, variable and chunk
//! - **Fetch and decode**: Blosc decompression, 2- or 4-byte little-endian
//!   floats, 2-D analysis or 3-D forecast tiles
//! - **Caching**: write-once memo tables with coalesced concurrent misses
//!
//! # Architecture
//!
//! ```text
//! PointSeries::fetch_analysis_series(var, start, end, lat, lng)
//!      │
//!      ├─► ChunkResolver::resolve(lat, lng)      (memoized per point)
//!      │         └─► ChunkIndex::nearest(x, y)
//!      │
//!      ├─► build_key(run, var, chunk)            (one key per hour)
//!      │
//!      ├─► TileFetcher::fetch(key)               (memoized per key)
//!      │         ├─► TileSource::get(key)
//!      │         ├─► Decompressor::decompress
//!      │         └─► decode_tile
//!      │
//!      └─► pixel at the in-chunk offset, reassembled in hour order
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hrrr_zarr::{ArchiveConfig, PointSeries, Variable};
//!
//! let series = PointSeries::from_config(ArchiveConfig::from_env())?;
//! let tmp = Variable::new("surface", "TMP");
//! let values = series
//!     .fetch_forecast_series(&tmp, issue_time, 40.7608, -111.8910)
//!     .await?;
//! ```

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod fetch;
pub mod index;
pub mod keys;
pub mod series;
pub mod store;
pub mod tile;
pub mod types;

// Re-export commonly used types at crate root
pub use cache::{CacheStats, Memo};
pub use codec::{decode_tile, BloscDecompressor, Decompressor};
pub use config::ArchiveConfig;
pub use error::{HrrrError, Result};
pub use fetch::TileFetcher;
pub use index::{ChunkIndex, ChunkResolver, GridChunkIndex, GridGeometry};
pub use keys::{build_key, format_chunk_id, ArchiveUrls, StoragePath};
pub use series::{analysis_hours, PointSeries, SeriesStats};
pub use store::{ArchiveStore, TileSource};
pub use tile::{DecodedTile, ElementType, TileShape};
pub use types::{
    ChunkCoordinate, GeoCoordinate, Model, ModelRun, PixelOffset, StorageKey, Variable,
    CHUNK_EDGE, CHUNK_PIXELS,
};

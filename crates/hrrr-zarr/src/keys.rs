//! Storage key construction for the HRRR Zarr archive layout.
//!
//! Layout of one chunk object:
//!
//! ```text
//! <run level>/<YYYYMMDD>/<YYYYMMDD>_<HH>z_<model>.zarr/
//!     <var level>/<var name>/<var level>/<var name>/<chunk>
//! ```
//!
//! The outer `<var level>/<var name>` is the Zarr group, the inner pair the
//! subgroup holding the array. Forecast arrays carry a leading time axis, so
//! their chunk token gets an extra `0.` prefix.

use crate::config::ArchiveConfig;
use crate::types::{ChunkCoordinate, Model, ModelRun, StorageKey, Variable};

/// Path builder for consistent archive layout.
pub struct StoragePath;

impl StoragePath {
    /// Root of a model run's Zarr store.
    /// Format: {level}/{YYYYMMDD}/{YYYYMMDD}_{HH}z_{model}.zarr
    pub fn run_root(run: &ModelRun) -> String {
        let date = run.issue_time().format("%Y%m%d");
        format!(
            "{}/{}/{}_{}z_{}.zarr",
            run.level(),
            date,
            date,
            run.issue_time().format("%H"),
            run.model()
        )
    }

    /// Zarr group of a variable.
    /// Format: {run root}/{var level}/{var name}
    pub fn group(run: &ModelRun, variable: &Variable) -> String {
        format!(
            "{}/{}/{}",
            Self::run_root(run),
            variable.level,
            variable.name
        )
    }

    /// Zarr subgroup of a variable.
    /// Format: {group}/{var level}
    pub fn subgroup(run: &ModelRun, variable: &Variable) -> String {
        format!("{}/{}", Self::group(run, variable), variable.level)
    }

    /// Object key of one chunk.
    /// Format: {subgroup}/{var name}/{chunk}
    pub fn chunk(run: &ModelRun, variable: &Variable, chunk: &ChunkCoordinate) -> StorageKey {
        StorageKey::from_path(format!(
            "{}/{}/{}",
            Self::subgroup(run, variable),
            variable.name,
            format_chunk_id(&chunk.chunk_id, run.model())
        ))
    }
}

/// Build the object-store key of the tile holding `chunk` for `variable` in `run`.
pub fn build_key(run: &ModelRun, variable: &Variable, chunk: &ChunkCoordinate) -> StorageKey {
    StoragePath::chunk(run, variable, chunk)
}

/// Chunk token as stored on disk for the given model.
pub fn format_chunk_id(chunk_id: &str, model: Model) -> String {
    match model {
        Model::Forecast => format!("0.{chunk_id}"),
        Model::Analysis => chunk_id.to_string(),
    }
}

/// Fully qualified URLs for keys, for links and external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveUrls {
    bucket: String,
    browse_host: String,
}

impl ArchiveUrls {
    pub fn new(bucket: impl Into<String>, browse_host: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            browse_host: browse_host.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(&config.bucket, &config.browse_host)
    }

    /// HTTPS link to the object.
    pub fn browse_url(&self, key: &StorageKey) -> String {
        format!("{}/{}", self.browse_host, key)
    }

    /// `s3://` URI of the object.
    pub fn s3_url(&self, key: &StorageKey) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    /// Link to the bucket's web explorer opened at a run.
    pub fn explorer_url(&self, run: &ModelRun) -> String {
        format!("{}/index.html#{}/", self.browse_host, StoragePath::run_root(run))
    }
}

impl Default for ArchiveUrls {
    fn default() -> Self {
        Self::from_config(&ArchiveConfig::default())
    }
}

//! Core identifiers: coordinates, model runs, variables and storage keys.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HrrrError;

/// Edge length of one chunk in pixels.
pub const CHUNK_EDGE: usize = 150;

/// Number of pixels in one 150×150 chunk slice.
pub const CHUNK_PIXELS: usize = CHUNK_EDGE * CHUNK_EDGE;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub lat: f64,
    pub lng: f64,
}

impl GeoCoordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether the point lies within [-90, 90] × [-180, 180].
    pub fn is_geodetic(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Position of a pixel inside a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelOffset {
    pub row: usize,
    pub col: usize,
}

impl PixelOffset {
    /// Whether both axes lie in [0, 150).
    pub fn is_in_chunk(&self) -> bool {
        self.row < CHUNK_EDGE && self.col < CHUNK_EDGE
    }
}

/// One chunk of the model grid and the queried pixel inside it.
///
/// Only constructed through [`ChunkCoordinate::new`], which enforces the
/// offset bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChunkCoordinate {
    /// Chunk token from the index, `"<y chunk>.<x chunk>"`.
    pub(crate) chunk_id: String,
    /// Offset of the queried point inside the chunk; both axes in [0, 150).
    pub(crate) in_chunk_offset: PixelOffset,
}

impl ChunkCoordinate {
    /// Create a chunk coordinate, rejecting offsets outside the chunk footprint.
    pub fn new(chunk_id: impl Into<String>, row: usize, col: usize) -> crate::Result<Self> {
        let chunk_id = chunk_id.into();
        let in_chunk_offset = PixelOffset { row, col };
        if !in_chunk_offset.is_in_chunk() {
            return Err(HrrrError::corrupt(
                chunk_id,
                format!("in-chunk offset ({row}, {col}) outside {CHUNK_EDGE}x{CHUNK_EDGE}"),
            ));
        }
        Ok(Self {
            chunk_id,
            in_chunk_offset,
        })
    }

    pub fn chunk_id(&self) -> &str {
        &self.chunk_id
    }

    pub fn in_chunk_offset(&self) -> PixelOffset {
        self.in_chunk_offset
    }
}

/// Archived model product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    /// Single-timestep analysis (`anl`).
    #[serde(rename = "anl")]
    Analysis,
    /// Multi-hour forecast (`fcst`).
    #[serde(rename = "fcst")]
    Forecast,
}

impl Model {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analysis => "anl",
            Self::Forecast => "fcst",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = HrrrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anl" => Ok(Self::Analysis),
            "fcst" => Ok(Self::Forecast),
            other => Err(HrrrError::Config(format!("unknown model {other:?}"))),
        }
    }
}

/// One archived model run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRun {
    issue_time: DateTime<Utc>,
    level: String,
    model: Model,
}

impl ModelRun {
    /// Create a run descriptor; `issue_time` is truncated to the hour.
    pub fn new(issue_time: DateTime<Utc>, level: impl Into<String>, model: Model) -> Self {
        Self {
            issue_time: truncate_to_hour(issue_time),
            level: level.into(),
            model,
        }
    }

    pub fn analysis(issue_time: DateTime<Utc>, level: impl Into<String>) -> Self {
        Self::new(issue_time, level, Model::Analysis)
    }

    pub fn forecast(issue_time: DateTime<Utc>, level: impl Into<String>) -> Self {
        Self::new(issue_time, level, Model::Forecast)
    }

    pub fn issue_time(&self) -> DateTime<Utc> {
        self.issue_time
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn model(&self) -> Model {
        self.model
    }
}

/// A physical quantity and its vertical-level grouping, e.g. `surface/TMP`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    pub level: String,
    pub name: String,
}

impl Variable {
    pub fn new(level: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.level, self.name)
    }
}

/// Object-store path of one compressed tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageKey(String);

impl StorageKey {
    pub(crate) fn from_path(path: String) -> Self {
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn truncate_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t - Duration::seconds(i64::from(t.minute() * 60 + t.second()))
        - Duration::nanoseconds(i64::from(t.nanosecond()))
}

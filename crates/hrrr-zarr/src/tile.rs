//! Decoded tiles.

use serde::{Deserialize, Serialize};

use crate::types::{PixelOffset, StorageKey, CHUNK_EDGE, CHUNK_PIXELS};

/// Marker of the one variable stored with 4-byte floats.
const WIDE_FORMAT_MARKER: &str = "surface/PRES";

/// On-disk element type of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    /// Little-endian IEEE 754 binary16.
    F16,
    /// Little-endian IEEE 754 binary32.
    F32,
}

impl ElementType {
    /// Element type of the tile stored under `key`.
    pub fn for_key(key: &StorageKey) -> Self {
        if key.as_str().contains(WIDE_FORMAT_MARKER) {
            Self::F32
        } else {
            Self::F16
        }
    }

    /// Width in bytes.
    pub fn width(&self) -> usize {
        match self {
            Self::F16 => 2,
            Self::F32 => 4,
        }
    }
}

/// Shape of a decoded tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileShape {
    /// 150×150 analysis snapshot.
    Snapshot,
    /// hours×150×150 forecast run.
    Run { hours: usize },
}

/// A decoded, immutable chunk.
///
/// Values are widened to `f32` (lossless for both element types) and stored
/// row-major as `[hour][row][col]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTile {
    element_type: ElementType,
    shape: TileShape,
    values: Vec<f32>,
}

impl DecodedTile {
    /// Wrap decoded values; `values.len()` must be a positive multiple of 150×150.
    pub(crate) fn new(element_type: ElementType, values: Vec<f32>) -> Self {
        let entries = values.len() / CHUNK_PIXELS;
        let shape = if entries == 1 {
            TileShape::Snapshot
        } else {
            TileShape::Run { hours: entries }
        };
        Self {
            element_type,
            shape,
            values,
        }
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn shape(&self) -> TileShape {
        self.shape
    }

    /// Array dimensions: `[150, 150]` or `[hours, 150, 150]`.
    pub fn dims(&self) -> Vec<usize> {
        match self.shape {
            TileShape::Snapshot => vec![CHUNK_EDGE, CHUNK_EDGE],
            TileShape::Run { hours } => vec![hours, CHUNK_EDGE, CHUNK_EDGE],
        }
    }

    /// Number of leading-axis entries (1 for a snapshot).
    pub fn hours(&self) -> usize {
        match self.shape {
            TileShape::Snapshot => 1,
            TileShape::Run { hours } => hours,
        }
    }

    /// Value at `(hour, offset)`, or `None` outside the tile.
    pub fn value_at(&self, hour: usize, offset: PixelOffset) -> Option<f32> {
        if hour >= self.hours() || offset.row >= CHUNK_EDGE || offset.col >= CHUNK_EDGE {
            return None;
        }
        self.values
            .get(hour * CHUNK_PIXELS + offset.row * CHUNK_EDGE + offset.col)
            .copied()
    }

    /// The pixel at `offset` for every leading-axis entry, in order, or
    /// `None` if `offset` lies outside the chunk.
    pub fn pixel_series(&self, offset: PixelOffset) -> Option<Vec<f32>> {
        (0..self.hours())
            .map(|hour| self.value_at(hour, offset))
            .collect()
    }

    /// Raw values in `[hour][row][col]` order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: &str) -> StorageKey {
        StorageKey::from_path(path.to_string())
    }

    #[test]
    fn test_element_type_for_key() {
        assert_eq!(
            ElementType::for_key(&key("sfc/20210101/20210101_07z_anl.zarr/surface/PRES/surface/PRES/4.3")),
            ElementType::F32
        );
        assert_eq!(
            ElementType::for_key(&key("sfc/20210101/20210101_07z_anl.zarr/surface/TMP/surface/TMP/4.3")),
            ElementType::F16
        );
        assert_eq!(
            ElementType::for_key(&key("prs/20210101/20210101_07z_anl.zarr/500mb/PRES/500mb/PRES/4.3")),
            ElementType::F16
        );
    }

    #[test]
    fn test_shape_from_length() {
        let snapshot = DecodedTile::new(ElementType::F16, vec![0.0; CHUNK_PIXELS]);
        assert_eq!(snapshot.shape(), TileShape::Snapshot);
        assert_eq!(snapshot.dims(), vec![150, 150]);

        let run = DecodedTile::new(ElementType::F16, vec![0.0; 18 * CHUNK_PIXELS]);
        assert_eq!(run.shape(), TileShape::Run { hours: 18 });
        assert_eq!(run.dims(), vec![18, 150, 150]);
    }

    #[test]
    fn test_value_at_bounds() {
        let mut values = vec![0.0; 2 * CHUNK_PIXELS];
        values[CHUNK_PIXELS + 3 * CHUNK_EDGE + 4] = 7.5;
        let tile = DecodedTile::new(ElementType::F32, values);

        assert_eq!(tile.value_at(1, PixelOffset { row: 3, col: 4 }), Some(7.5));
        assert_eq!(tile.value_at(2, PixelOffset { row: 0, col: 0 }), None);
        assert_eq!(tile.value_at(0, PixelOffset { row: 150, col: 0 }), None);
    }

    #[test]
    fn test_pixel_series_of_snapshot_has_one_value() {
        let tile = DecodedTile::new(ElementType::F16, vec![1.0; CHUNK_PIXELS]);
        assert_eq!(
            tile.pixel_series(PixelOffset { row: 0, col: 0 }),
            Some(vec![1.0])
        );
    }

    #[test]
    fn test_pixel_series_outside_chunk_is_none() {
        let tile = DecodedTile::new(ElementType::F16, vec![1.0; 3 * CHUNK_PIXELS]);
        assert_eq!(tile.pixel_series(PixelOffset { row: 150, col: 0 }), None);
        assert_eq!(tile.pixel_series(PixelOffset { row: 0, col: 150 }), None);
    }
}

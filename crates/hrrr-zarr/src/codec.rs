//! Decompression and byte-layout decoding of archive chunks.

use std::borrow::Cow;

use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::codec::{BytesToBytesCodecTraits, CodecOptions};
use zarrs::array::BytesRepresentation;

use crate::error::{HrrrError, Result};
use crate::tile::{DecodedTile, ElementType};
use crate::types::{StorageKey, CHUNK_PIXELS};

/// Reverses the archive's block compression.
///
/// Failures are reported as `CorruptPayload`; they are never transient.
pub trait Decompressor: Send + Sync {
    fn decompress(&self, key: &StorageKey, compressed: &[u8]) -> Result<Vec<u8>>;
}

/// Blosc decompressor backed by the zarrs codec.
///
/// Blosc frames carry their own compressor and shuffle settings in the
/// header, so the parameters used to build the codec do not affect decoding.
pub struct BloscDecompressor {
    codec: BloscCodec,
    options: CodecOptions,
}

impl BloscDecompressor {
    pub fn new() -> Result<Self> {
        let level = BloscCompressionLevel::try_from(5u8)
            .map_err(|_| HrrrError::Config("Invalid blosc compression level".to_string()))?;
        let codec = BloscCodec::new(
            BloscCompressor::LZ4,
            level,
            None,
            BloscShuffleMode::NoShuffle,
            None,
        )
        .map_err(|e| HrrrError::Config(e.to_string()))?;

        Ok(Self {
            codec,
            options: CodecOptions::default(),
        })
    }
}

impl Decompressor for BloscDecompressor {
    fn decompress(&self, key: &StorageKey, compressed: &[u8]) -> Result<Vec<u8>> {
        self.codec
            .decode(
                Cow::Borrowed(compressed),
                &BytesRepresentation::UnboundedSize,
                &self.options,
            )
            .map(Cow::into_owned)
            .map_err(|e| HrrrError::corrupt(key.as_str(), format!("blosc: {e}")))
    }
}

/// Interpret a decompressed buffer as a tile.
///
/// The element width comes from the key; the number of leading entries from
/// the buffer length, which must be a positive multiple of 150×150 elements.
pub fn decode_tile(key: &StorageKey, raw: &[u8]) -> Result<DecodedTile> {
    let element_type = ElementType::for_key(key);
    let entry_bytes = CHUNK_PIXELS * element_type.width();

    if raw.is_empty() || raw.len() % entry_bytes != 0 {
        return Err(HrrrError::corrupt(
            key.as_str(),
            format!(
                "{} bytes is not a whole number of 150x150 {:?} slices ({} bytes each)",
                raw.len(),
                element_type,
                entry_bytes
            ),
        ));
    }

    let values: Vec<f32> = match element_type {
        ElementType::F16 => raw
            .chunks_exact(2)
            .map(|b| half::f16::from_le_bytes([b[0], b[1]]).to_f32())
            .collect(),
        ElementType::F32 => raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    };

    Ok(DecodedTile::new(element_type, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileShape;
    use test_utils::{
        blosc_compress, create_pressure_tile, create_tile_values, encode_f16_le, encode_f32_le,
        tile_value,
    };

    fn tmp_key() -> StorageKey {
        StorageKey::from_path(
            "sfc/20210101/20210101_07z_fcst.zarr/surface/TMP/surface/TMP/0.4.3".to_string(),
        )
    }

    fn pres_key() -> StorageKey {
        StorageKey::from_path(
            "sfc/20210101/20210101_07z_anl.zarr/surface/PRES/surface/PRES/4.3".to_string(),
        )
    }

    #[test]
    fn test_decode_snapshot() {
        let raw = encode_f16_le(&create_tile_values(1));
        let tile = decode_tile(&tmp_key(), &raw).unwrap();
        assert_eq!(tile.shape(), TileShape::Snapshot);
        assert_eq!(tile.dims(), vec![150, 150]);
        assert_eq!(tile.values()[151], tile_value(0, 1, 1));
    }

    #[test]
    fn test_decode_forecast_run() {
        let raw = encode_f16_le(&create_tile_values(18));
        let tile = decode_tile(&tmp_key(), &raw).unwrap();
        assert_eq!(tile.shape(), TileShape::Run { hours: 18 });
        assert_eq!(tile.dims(), vec![18, 150, 150]);
    }

    #[test]
    fn test_decode_rejects_partial_slice() {
        let mut raw = encode_f16_le(&create_tile_values(1));
        raw.extend_from_slice(&[0, 0]);
        let err = decode_tile(&tmp_key(), &raw).unwrap_err();
        assert!(matches!(err, HrrrError::CorruptPayload { .. }));
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert!(matches!(
            decode_tile(&tmp_key(), &[]),
            Err(HrrrError::CorruptPayload { .. })
        ));
    }

    #[test]
    fn test_pressure_uses_wide_elements() {
        let values = create_pressure_tile(1);
        let tile = decode_tile(&pres_key(), &encode_f32_le(&values)).unwrap();
        assert_eq!(tile.element_type(), ElementType::F32);
        assert_eq!(tile.shape(), TileShape::Snapshot);
        assert_eq!(tile.values()[0], 101_325.0);
    }

    #[test]
    fn test_pressure_with_narrow_payload_is_reinterpreted() {
        // 2 × 150×150 two-byte values read as one 150×150 slice of 4-byte values
        let raw = encode_f16_le(&create_tile_values(2));
        let tile = decode_tile(&pres_key(), &raw).unwrap();
        assert_eq!(tile.shape(), TileShape::Snapshot);
        assert_eq!(tile.element_type(), ElementType::F32);
    }

    #[test]
    fn test_blosc_roundtrip() {
        let raw = encode_f16_le(&create_tile_values(3));
        let compressed = blosc_compress(&raw, 2);
        assert!(compressed.len() < raw.len());

        let decompressor = BloscDecompressor::new().unwrap();
        let out = decompressor.decompress(&tmp_key(), &compressed).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_blosc_rejects_garbage() {
        let decompressor = BloscDecompressor::new().unwrap();
        let err = decompressor
            .decompress(&tmp_key(), b"definitely not a blosc frame")
            .unwrap_err();
        assert!(matches!(err, HrrrError::CorruptPayload { .. }));
        assert!(!err.is_retryable());
    }
}

//! Common test fixtures for hrrr-zarr tests.
//!
//! Payload encoders produce bytes laid out the way the HRRR Zarr archive
//! stores chunks: little-endian floats, Blosc compressed.

use std::borrow::Cow;
use std::sync::Arc;

use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::codec::{BytesToBytesCodecTraits, CodecOptions};

/// Well-known query points.
pub mod points {
    /// Salt Lake City, UT.
    pub const SALT_LAKE_CITY: (f64, f64) = (40.7608, -111.8910);

    /// Chunk covering Salt Lake City in the HRRR grid.
    pub const SALT_LAKE_CITY_CHUNK: &str = "4.3";

    /// (row, col) of Salt Lake City inside its chunk.
    pub const SALT_LAKE_CITY_OFFSET: (usize, usize) = (44, 46);

    /// Kansas City, MO.
    pub const KANSAS_CITY: (f64, f64) = (39.0, -94.5);
}

/// Serialize values as little-endian 2-byte floats.
pub fn encode_f16_le(values: &[f32]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|&v| half::f16::from_f32(v).to_le_bytes())
        .collect()
}

/// Serialize values as little-endian 4-byte floats.
pub fn encode_f32_le(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|&v| v.to_le_bytes()).collect()
}

/// Compress a raw buffer with Blosc (LZ4, byte shuffle).
pub fn blosc_compress(raw: &[u8], typesize: usize) -> Bytes {
    let level = BloscCompressionLevel::try_from(5u8).expect("valid blosc level");
    let codec = BloscCodec::new(
        BloscCompressor::LZ4,
        level,
        None,
        BloscShuffleMode::Shuffle,
        Some(typesize),
    )
    .expect("valid blosc codec");

    let encoded = codec
        .encode(Cow::Borrowed(raw), &CodecOptions::default())
        .expect("blosc encode");
    Bytes::from(encoded.into_owned())
}

/// Compressed payload of a tile stored with 2-byte floats.
pub fn compressed_f16_tile(values: &[f32]) -> Bytes {
    blosc_compress(&encode_f16_le(values), 2)
}

/// Compressed payload of a tile stored with 4-byte floats.
pub fn compressed_f32_tile(values: &[f32]) -> Bytes {
    blosc_compress(&encode_f32_le(values), 4)
}

/// Build an in-memory object store holding the given `(key, payload)` objects.
pub async fn archive_with(objects: Vec<(String, Bytes)>) -> Arc<InMemory> {
    let store = Arc::new(InMemory::new());
    for (key, payload) in objects {
        store
            .put(&Path::from(key.as_str()), PutPayload::from(payload))
            .await
            .expect("in-memory put");
    }
    store
}

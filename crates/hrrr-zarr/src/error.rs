//! Error types for archive access.

use thiserror::Error;

/// Errors that can occur while resolving, fetching or decoding tiles.
#[derive(Error, Debug, Clone)]
pub enum HrrrError {
    /// The requested chunk/tile does not exist in the archive.
    #[error("object not found: {0}")]
    NotFound(String),

    /// Network or timeout failure talking to an external service.
    /// Safe to retry; this crate never retries on its own.
    #[error("transient I/O error: {0}")]
    TransientIo(String),

    /// Decompression or byte-layout validation failed.
    #[error("corrupt payload for {key}: {reason}")]
    CorruptPayload { key: String, reason: String },

    /// Latitude/longitude rejected by the coordinate policy.
    #[error("invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl HrrrError {
    /// Create a NotFound error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a TransientIo error.
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::TransientIo(msg.into())
    }

    /// Create a CorruptPayload error.
    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptPayload {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientIo(_))
    }
}

impl From<object_store::Error> for HrrrError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => Self::NotFound(path),
            other => Self::TransientIo(other.to_string()),
        }
    }
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, HrrrError>;

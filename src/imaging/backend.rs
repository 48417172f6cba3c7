//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the codec contract the thumbnail generator
//! consumes: decode, bounded resize, JPEG encode. Everything operates on
//! in-memory bytes because the originals live in a storage drive, not on the
//! local filesystem.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image` crate.

use super::params::{SourceFormat, ThumbnailParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Encoded thumbnail bytes plus the dimensions they were encoded at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedThumbnail {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
}

/// Trait for image codec backends.
///
/// Implementations must be deterministic: the same bytes and parameters give
/// the same output. Concurrent duplicate thumbnail generation for one path
/// relies on this to make overwrites harmless.
pub trait ImageBackend: Send + Sync {
    /// Decode, shrink to fit the bounds, and encode as JPEG.
    fn thumbnail(
        &self,
        format: SourceFormat,
        content: &[u8],
        params: &ThumbnailParams,
    ) -> Result<EncodedThumbnail, BackendError>;
}

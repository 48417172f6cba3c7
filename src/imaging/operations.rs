//! Thumbnail generation.
//!
//! Combines format selection, dimension planning, backend execution and the
//! final upload. Given the same bytes and configuration the output is always
//! the same, so two workers generating the same thumbnail at once just
//! overwrite each other with identical content.
//!
//! ## Thumbnail namespace
//!
//! A thumbnail lives at the original's key prefixed with [`THUMBNAIL_ROOT`]:
//!
//! ```text
//! 2023/05/01/photo.png  →  .thumbnail/2023/05/01/photo.png
//! ```
//!
//! The name keeps the original extension even though the bytes are always JPEG.

use super::backend::{BackendError, EncodedThumbnail, ImageBackend};
use super::params::{Quality, SourceFormat, ThumbnailParams};
use crate::storage::{StorageDrive, StorageError, join_key};
use thiserror::Error;

/// Key segment under which every thumbnail is stored.
pub const THUMBNAIL_ROOT: &str = ".thumbnail";

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("failed to encode thumbnail for {path}: {message}")]
    Encode { path: String, message: String },
    #[error("failed to store thumbnail: {0}")]
    Storage(#[from] StorageError),
}

impl ThumbnailError {
    fn from_backend(path: &str, err: BackendError) -> Self {
        match err {
            BackendError::Decode(message) => Self::Decode {
                path: path.to_string(),
                message,
            },
            BackendError::Encode(message) => Self::Encode {
                path: path.to_string(),
                message,
            },
        }
    }
}

/// Key of the thumbnail derived from the original at `path`.
pub fn thumbnail_path(path: &str) -> String {
    join_key(&[THUMBNAIL_ROOT, path])
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_width: 500,
            max_height: 500,
            quality: Quality::default(),
        }
    }
}

/// Plan a thumbnail operation without executing it.
///
/// Fails with [`ThumbnailError::UnsupportedFormat`] for extensions outside the
/// allow-list, before any bytes are looked at.
pub fn plan_thumbnail(
    path: &str,
    config: &ThumbnailConfig,
) -> Result<(SourceFormat, ThumbnailParams), ThumbnailError> {
    let format = SourceFormat::from_path(path)
        .ok_or_else(|| ThumbnailError::UnsupportedFormat(path.to_string()))?;
    Ok((
        format,
        ThumbnailParams {
            max_width: config.max_width,
            max_height: config.max_height,
            quality: config.quality,
        },
    ))
}

/// Decode, shrink, encode and upload a thumbnail for the original at `path`.
///
/// Returns the encoded thumbnail as uploaded.
pub fn create_thumbnail(
    backend: &dyn ImageBackend,
    drive: &dyn StorageDrive,
    path: &str,
    content: &[u8],
    config: &ThumbnailConfig,
) -> Result<EncodedThumbnail, ThumbnailError> {
    let (format, params) = plan_thumbnail(path, config)?;
    let thumb = backend
        .thumbnail(format, content, &params)
        .map_err(|e| ThumbnailError::from_backend(path, e))?;

    drive.upload(
        &thumbnail_path(path),
        &mut thumb.bytes.as_slice(),
        thumb.bytes.len() as u64,
    )?;
    Ok(thumb)
}

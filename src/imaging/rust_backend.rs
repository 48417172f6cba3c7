//! Pure Rust codec backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory_with_format` |
//! | Resize | `image::DynamicImage::resize_exact` with `Triangle` (bilinear) filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//!
//! Thumbnails are always JPEG, whatever the source format. Alpha is dropped by
//! converting to RGB8 before encoding, since JPEG has no alpha channel.

use super::backend::{BackendError, Dimensions, EncodedThumbnail, ImageBackend};
use super::calculations::calculate_fit_dimensions;
use super::params::{Quality, SourceFormat, ThumbnailParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder};

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode in-memory bytes with the decoder chosen by extension.
fn load_image(format: SourceFormat, content: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory_with_format(content, format.image_format())
        .map_err(|e| BackendError::Decode(format!("{format:?}: {e}")))
}

/// Encode as baseline JPEG at the given quality.
fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.value() as u8)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn thumbnail(
        &self,
        format: SourceFormat,
        content: &[u8],
        params: &ThumbnailParams,
    ) -> Result<EncodedThumbnail, BackendError> {
        let img = load_image(format, content)?;

        let (width, height) = calculate_fit_dimensions(
            (img.width(), img.height()),
            (params.max_width, params.max_height),
        );
        let resized = if (width, height) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(width, height, FilterType::Triangle)
        };

        let bytes = encode_jpeg(&resized, params.quality)?;
        Ok(EncodedThumbnail {
            bytes,
            dimensions: Dimensions { width, height },
        })
    }
}

//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the thumbnail generator in [`operations`](super::operations)
//! (which decides what to produce and where it goes) and the
//! [`backend`](super::backend) (which does the actual pixel work). The split
//! lets tests swap in a recording backend without touching generator logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 75). Clamped on construction.
//! - [`SourceFormat`]: the decode allow-list, selected by file extension.
//! - [`ThumbnailParams`]: bounding box plus quality for one thumbnail.

use image::ImageFormat;

/// Quality setting for lossy image encoding (1-100).
///
/// Only [`Quality::new`] builds one, so the value is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// Source formats with a decoder compiled in.
///
/// Selection is by file extension only; the bytes are never sniffed. A `.png`
/// name holding JPEG bytes is a decode error, not a silent format switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Tiff,
}

const EXTENSIONS: &[(&str, SourceFormat)] = &[
    ("jpg", SourceFormat::Jpeg),
    ("jpeg", SourceFormat::Jpeg),
    ("png", SourceFormat::Png),
    ("webp", SourceFormat::WebP),
    ("tif", SourceFormat::Tiff),
    ("tiff", SourceFormat::Tiff),
];

impl SourceFormat {
    /// Look up the format for a storage path by its extension (case-insensitive).
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = name.rsplit_once('.')?;
        EXTENSIONS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
            .map(|(_, format)| *format)
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            SourceFormat::Jpeg => ImageFormat::Jpeg,
            SourceFormat::Png => ImageFormat::Png,
            SourceFormat::WebP => ImageFormat::WebP,
            SourceFormat::Tiff => ImageFormat::Tiff,
        }
    }
}

/// Returns every extension the thumbnail generator accepts.
pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    EXTENSIONS.iter().map(|(ext, _)| *ext)
}

/// Parameters for a thumbnail operation (bounded resize + re-encode).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailParams {
    /// Upper bound on the output width. Not a target.
    pub max_width: u32,
    /// Upper bound on the output height. Not a target.
    pub max_height: u32,
    pub quality: Quality,
}

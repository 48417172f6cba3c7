//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory_with_format` |
//! | **Bounded resize** | `resize_exact` with `Triangle` (bilinear) |
//! | **Encode** | `JpegEncoder::new_with_quality` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The thumbnail generator combining the above with a storage drive

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, EncodedThumbnail, ImageBackend};
pub use calculations::calculate_fit_dimensions;
pub use operations::{
    THUMBNAIL_ROOT, ThumbnailConfig, ThumbnailError, create_thumbnail, plan_thumbnail,
    thumbnail_path,
};
pub use params::{Quality, SourceFormat, ThumbnailParams, supported_extensions};
pub use rust_backend::RustBackend;

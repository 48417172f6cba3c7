//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the dimensions of an image scaled to fit inside a bounding box.
///
/// The box is an upper bound, not a target: a source that already fits is
/// returned unchanged (no upscaling). Otherwise the axis that overflows the
/// most is scaled down to its bound and the other axis follows proportionally,
/// so both results stay within the box. Neither result drops below 1px.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `bounds` - Maximum (width, height)
///
/// # Examples
/// ```
/// # use photoshelf::imaging::calculate_fit_dimensions;
/// // 2000x1000 into a 100x100 box → 100x50
/// assert_eq!(calculate_fit_dimensions((2000, 1000), (100, 100)), (100, 50));
///
/// // Already inside the box → untouched
/// assert_eq!(calculate_fit_dimensions((80, 60), (100, 100)), (80, 60));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w == 0 || src_h == 0 || max_w == 0 || max_h == 0 {
        return (src_w.min(max_w), src_h.min(max_h));
    }
    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let ratio = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * ratio).round() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * ratio).round() as u32).clamp(1, max_h);
    (w, h)
}

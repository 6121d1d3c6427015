//! Shared test utilities: synthetic buffers, image fixtures, and assertions
//! about resolved sizes and node schemas.

use crate::nodes::InputSpec;
use crate::resolution::OrientedSize;
use image::{Rgb, RgbImage};
use ndarray::Array4;
use std::path::{Path, PathBuf};

// =========================================================================
// Buffers and fixtures
// =========================================================================

/// A `(batch, h, w, c)` buffer whose samples are all distinct and lie in
/// `[0, 1)`, so any slice can be traced back to its source position.
pub fn gradient_buffer(batch: usize, h: usize, w: usize, c: usize) -> Array4<f32> {
    let total = (batch * h * w * c).max(1) as f32;
    Array4::from_shape_fn((batch, h, w, c), |(b, y, x, ch)| {
        let flat = ((b * h + y) * w + x) * c + ch;
        flat as f32 / total
    })
}

/// Write a `w × h` PNG to `dir/name`. Red and green encode the pixel
/// position, blue is `blue` everywhere.
pub fn write_test_png(dir: &Path, name: &str, w: u32, h: u32, blue: u8) -> PathBuf {
    let path = dir.join(name);
    let img = RgbImage::from_fn(w, h, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, blue]));
    img.save(&path).unwrap();
    path
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert `size` is `(w, h)` or `(h, w)` with the larger side at least as
/// large as the smaller one and both positive.
pub fn assert_permutation(size: OrientedSize, w: u32, h: u32) {
    assert!(
        (size.width, size.height) == (w, h) || (size.width, size.height) == (h, w),
        "{size} is not a permutation of {w}x{h}"
    );
    assert!(size.larger() >= size.smaller() && size.smaller() >= 1, "{size}");
}

/// Input names in declaration order.
pub fn input_names(inputs: &[InputSpec]) -> Vec<&str> {
    inputs.iter().map(|i| i.name.as_str()).collect()
}

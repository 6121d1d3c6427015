//! Bounds-safe rectangular crop over `(batch, height, width, channel)` buffers.
//!
//! Cropping happens in two passes:
//!
//! 1. **Constrain** (optional, on by default): pull the origin inside the
//!    image and shrink the extent so the whole rectangle fits.
//! 2. **Slice bounds** (always): re-clamp the origin, clamp the end
//!    coordinates to the image, and widen any collapsed span to one pixel.
//!
//! The result is a borrowed view over the caller's buffer; batch and channel
//! axes are preserved and the source is never written. No request, however
//! far out of range, produces an empty view.

use ndarray::{ArrayView4, s};
use serde::{Deserialize, Serialize};

/// Upper bound hosts place on crop coordinates and extents.
pub const MAX_EXTENT: u32 = 16384;

/// A requested crop rectangle in pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for CropRect {
    fn default() -> Self {
        Self::new(0, 0, 512, 512)
    }
}

impl CropRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamp into an `image_w × image_h` image: origin inside the image,
    /// extent at least 1 and no further than the far edge.
    pub fn constrain_to(self, image_w: usize, image_h: usize) -> Self {
        let x = (self.x as usize).min(image_w.saturating_sub(1));
        let y = (self.y as usize).min(image_h.saturating_sub(1));
        let w = (self.width as usize).min(image_w.saturating_sub(x)).max(1);
        let h = (self.height as usize).min(image_h.saturating_sub(y)).max(1);
        Self::new(x as u32, y as u32, w as u32, h as u32)
    }

    /// Half-open pixel ranges to slice, guaranteed in-bounds and non-empty
    /// for any image with non-zero dimensions.
    pub fn slice_bounds(self, image_w: usize, image_h: usize) -> SliceBounds {
        let (x0, x1) = span(self.x, self.width, image_w);
        let (y0, y1) = span(self.y, self.height, image_h);
        SliceBounds { x0, y0, x1, y1 }
    }
}

/// Clamp one axis: `start` into `[0, len-1]`, end into `[1, len]`, and a
/// collapsed span widened to a single pixel.
fn span(start: u32, extent: u32, len: usize) -> (usize, usize) {
    let start = (start as usize).min(len.saturating_sub(1));
    let extent = (extent as usize).max(1);
    let mut end = start.saturating_add(extent).min(len).max(1);
    if end <= start {
        end = len.min(start + 1);
    }
    (start, end)
}

/// Resolved slice ranges: columns `x0..x1`, rows `y0..y1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SliceBounds {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl SliceBounds {
    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }
}

/// The slice ranges [`crop`] will use for an `image_w × image_h` image.
pub fn effective_bounds(
    rect: CropRect,
    image_w: usize,
    image_h: usize,
    constrain_to_image: bool,
) -> SliceBounds {
    let rect = if constrain_to_image {
        rect.constrain_to(image_w, image_h)
    } else {
        rect
    };
    rect.slice_bounds(image_w, image_h)
}

/// Crop every frame of `buffer` to `rect`.
///
/// A buffer with zero height or width has nothing to crop and is returned
/// as-is.
pub fn crop<'a>(
    buffer: ArrayView4<'a, f32>,
    rect: CropRect,
    constrain_to_image: bool,
) -> ArrayView4<'a, f32> {
    let (_, image_h, image_w, _) = buffer.dim();
    if image_h == 0 || image_w == 0 {
        return buffer;
    }
    let b = effective_bounds(rect, image_w, image_h, constrain_to_image);
    buffer.slice_move(s![.., b.y0..b.y1, b.x0..b.x1, ..])
}

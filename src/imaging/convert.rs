//! Pure conversions between decoded images and f32 frames.

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use ndarray::ArrayView3;

/// Channels in every decoded frame.
pub const CHANNELS: usize = 3;

/// One decoded image as row-major `(height, width, CHANNELS)` samples.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Frame {
    pub width: usize,
    pub height: usize,
    pub samples: Vec<f32>,
}

pub(super) fn frame_from_image(img: &DynamicImage) -> Frame {
    let rgb = img.to_rgb32f();
    Frame {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
        samples: rgb.into_raw(),
    }
}

/// Map a `[0, 1]` sample to 8 bits. Out-of-range values saturate.
pub(super) fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Build an 8-bit image from an `(height, width, channels)` view.
///
/// Works on strided views, so cropped buffers need no copy first. `None`
/// for channel counts other than 1, 3 or 4.
pub(super) fn image_from_frame(frame: ArrayView3<'_, f32>) -> Option<DynamicImage> {
    let (h, w, c) = frame.dim();
    let bytes: Vec<u8> = frame.iter().copied().map(quantize).collect();
    let (w, h) = (w as u32, h as u32);
    match c {
        1 => GrayImage::from_raw(w, h, bytes).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(w, h, bytes).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(w, h, bytes).map(DynamicImage::ImageRgba8),
        _ => None,
    }
}

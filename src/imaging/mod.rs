//! Image files ⇄ `(batch, height, width, channel)` f32 buffers.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (JPEG, PNG, TIFF, WebP) | `image::ImageReader` → `to_rgb32f` |
//! | **Stack** | `ndarray::Array4::from_shape_vec` |
//! | **Encode** | `image::DynamicImage::save_with_format` |
//!
//! Samples are `[0, 1]` floats, the layout node hosts use for image
//! tensors. Decoded frames always carry three channels; encoding accepts
//! one, three or four.
//!
//! The module is split into:
//! - **Convert**: pure frame ⇄ `DynamicImage` conversions (unit testable)
//! - **Batch**: file loading and saving, [`ImagingError`]

mod batch;
mod convert;

pub use batch::{ImagingError, frame_path, load_batch, save_batch};
pub use convert::CHANNELS;

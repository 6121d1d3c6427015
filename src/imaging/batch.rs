//! Loading files into one batch and writing a batch back out.

use super::convert::{CHANNELS, Frame, frame_from_image, image_from_frame};
use image::{DynamicImage, ImageFormat, ImageReader};
use ndarray::{Array4, ArrayView4, Axis};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to decode {0}")]
    Decode(String),
    #[error("Failed to encode {0}")]
    Encode(String),
    #[error(
        "{} is {width}x{height}, but the batch is {expected_width}x{expected_height}",
        .path.display()
    )]
    BatchMismatch {
        path: PathBuf,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },
    #[error("no images to process")]
    Empty,
}

fn load_frame(path: &Path) -> Result<Frame, ImagingError> {
    let open_err = |source| ImagingError::Open {
        path: path.to_path_buf(),
        source,
    };
    let img = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(open_err)?
        .decode()
        .map_err(|e| ImagingError::Decode(format!("{}: {e}", path.display())))?;
    tracing::debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "decoded"
    );
    Ok(frame_from_image(&img))
}

/// Decode `paths` into one `(N, H, W, 3)` buffer, in argument order.
///
/// Every image must have the dimensions of the first.
pub fn load_batch<P: AsRef<Path>>(paths: &[P]) -> Result<Array4<f32>, ImagingError> {
    let mut frames: Vec<Frame> = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let frame = load_frame(path)?;
        if let Some(first) = frames.first() {
            if (frame.width, frame.height) != (first.width, first.height) {
                return Err(ImagingError::BatchMismatch {
                    path: path.to_path_buf(),
                    width: frame.width,
                    height: frame.height,
                    expected_width: first.width,
                    expected_height: first.height,
                });
            }
        }
        frames.push(frame);
    }
    let Some(first) = frames.first() else {
        return Err(ImagingError::Empty);
    };
    let shape = (frames.len(), first.height, first.width, CHANNELS);
    let samples: Vec<f32> = frames.into_iter().flat_map(|f| f.samples).collect();
    Array4::from_shape_vec(shape, samples)
        .map_err(|e| ImagingError::Decode(format!("batch layout: {e}")))
}

/// Output path for frame `index` of `count`: `output` itself for a single
/// frame, `<stem>_<index>.<ext>` beside it otherwise.
pub fn frame_path(output: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{stem}_{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{index}"),
    };
    output.with_file_name(name)
}

/// Encode every frame of `batch`, choosing the format from `output`'s
/// extension. Returns the written paths in frame order.
pub fn save_batch(batch: ArrayView4<'_, f32>, output: &Path) -> Result<Vec<PathBuf>, ImagingError> {
    let format = ImageFormat::from_path(output)
        .map_err(|e| ImagingError::Encode(format!("{}: {e}", output.display())))?;
    if !format.writing_enabled() {
        return Err(ImagingError::Encode(format!(
            "{}: no encoder for {format:?}",
            output.display()
        )));
    }
    let count = batch.len_of(Axis(0));
    if count == 0 {
        return Err(ImagingError::Empty);
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut written = Vec::with_capacity(count);
    for (index, frame) in batch.outer_iter().enumerate() {
        let channels = frame.dim().2;
        let img = image_from_frame(frame).ok_or_else(|| {
            ImagingError::Encode(format!("frame {index}: unsupported channel count {channels}"))
        })?;
        // JPEG has no alpha channel.
        let img = if format == ImageFormat::Jpeg && img.color().has_alpha() {
            DynamicImage::ImageRgb8(img.to_rgb8())
        } else {
            img
        };
        let path = frame_path(output, index, count);
        img.save_with_format(&path, format)
            .map_err(|e| ImagingError::Encode(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), width = img.width(), height = img.height(), "wrote frame");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient_buffer, write_test_png};
    use tempfile::TempDir;

    // =========================================================================
    // frame_path
    // =========================================================================

    #[test]
    fn frame_path_single_frame_is_output() {
        let p = Path::new("out/crop.png");
        assert_eq!(frame_path(p, 0, 1), PathBuf::from("out/crop.png"));
    }

    #[test]
    fn frame_path_numbers_batch_frames() {
        let p = Path::new("out/crop.png");
        assert_eq!(frame_path(p, 0, 3), PathBuf::from("out/crop_0.png"));
        assert_eq!(frame_path(p, 2, 3), PathBuf::from("out/crop_2.png"));
    }

    #[test]
    fn frame_path_without_extension() {
        assert_eq!(frame_path(Path::new("crop"), 1, 2), PathBuf::from("crop_1"));
    }

    // =========================================================================
    // load_batch
    // =========================================================================

    #[test]
    fn load_batch_stacks_frames_in_order() {
        let tmp = TempDir::new().unwrap();
        let a = write_test_png(tmp.path(), "a.png", 4, 3, 10);
        let b = write_test_png(tmp.path(), "b.png", 4, 3, 200);
        let batch = load_batch(&[a, b]).unwrap();
        assert_eq!(batch.dim(), (2, 3, 4, 3));
        assert!((batch[[0, 0, 0, 2]] - 10.0 / 255.0).abs() < 1e-6);
        assert!((batch[[1, 0, 0, 2]] - 200.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn load_batch_rejects_mismatched_sizes() {
        let tmp = TempDir::new().unwrap();
        let a = write_test_png(tmp.path(), "a.png", 4, 3, 0);
        let b = write_test_png(tmp.path(), "b.png", 5, 3, 0);
        let err = load_batch(&[a, b.clone()]).unwrap_err();
        match err {
            ImagingError::BatchMismatch {
                path,
                width,
                expected_width,
                ..
            } => {
                assert_eq!(path, b);
                assert_eq!((width, expected_width), (5, 4));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_batch_empty_is_error() {
        let none: [PathBuf; 0] = [];
        assert!(matches!(load_batch(&none), Err(ImagingError::Empty)));
    }

    #[test]
    fn load_batch_missing_file_names_the_path() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.png");
        let err = load_batch(&[missing.clone()]).unwrap_err();
        match &err {
            ImagingError::Open { path, source } => {
                assert_eq!(path, &missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("nope.png"), "{err}");
    }

    #[test]
    fn load_batch_garbage_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("junk.png");
        fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(load_batch(&[path]), Err(ImagingError::Decode(_))));
    }

    // =========================================================================
    // save_batch
    // =========================================================================

    #[test]
    fn save_single_frame_writes_output_path() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("nested/crop.png");
        let buf = gradient_buffer(1, 6, 8, 3);
        let written = save_batch(buf.view(), &out).unwrap();
        assert_eq!(written, vec![out.clone()]);
        assert_eq!(image::image_dimensions(&out).unwrap(), (8, 6));
    }

    #[test]
    fn save_batch_writes_one_file_per_frame() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("crop.png");
        let buf = gradient_buffer(3, 4, 4, 4);
        let written = save_batch(buf.view(), &out).unwrap();
        assert_eq!(written.len(), 3);
        assert!(!out.exists());
        for (i, p) in written.iter().enumerate() {
            assert_eq!(p, &tmp.path().join(format!("crop_{i}.png")));
            assert!(p.exists());
        }
    }

    #[test]
    fn save_png_round_trips_samples() {
        let tmp = TempDir::new().unwrap();
        let src = write_test_png(tmp.path(), "src.png", 5, 4, 77);
        let batch = load_batch(&[src]).unwrap();
        let out = tmp.path().join("copy.png");
        save_batch(batch.view(), &out).unwrap();
        assert_eq!(load_batch(&[out]).unwrap(), batch);
    }

    #[test]
    fn save_jpeg_drops_alpha() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("crop.jpg");
        let buf = gradient_buffer(1, 8, 8, 4);
        save_batch(buf.view(), &out).unwrap();
        assert_eq!(image::image_dimensions(&out).unwrap(), (8, 8));
    }

    #[test]
    fn save_rejects_unknown_extension() {
        let tmp = TempDir::new().unwrap();
        let buf = gradient_buffer(1, 2, 2, 3);
        let result = save_batch(buf.view(), &tmp.path().join("crop.xyz"));
        assert!(matches!(result, Err(ImagingError::Encode(_))));
    }

    #[test]
    fn save_rejects_two_channel_frames() {
        let tmp = TempDir::new().unwrap();
        let buf = gradient_buffer(1, 2, 2, 2);
        let result = save_batch(buf.view(), &tmp.path().join("crop.png"));
        assert!(matches!(result, Err(ImagingError::Encode(_))));
    }
}

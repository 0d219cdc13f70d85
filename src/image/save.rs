//! Image saving utilities.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use ndarray::ArrayView3;

use crate::error::{Error, Result};

/// Save an HWC canvas (such as a filter grid) as an 8-bit image.
///
/// Samples are clamped to `[0, 255]` and truncated, matching an
/// `astype(uint8)` view of a `[0, 255]` canvas. One channel is written as
/// grayscale, three as RGB and four as RGBA. The format is inferred from the
/// file extension.
///
/// # Errors
///
/// Returns an error if the channel count is unsupported or the image cannot
/// be saved.
pub fn save_grid<P: AsRef<Path>>(canvas: ArrayView3<'_, f32>, path: P) -> Result<()> {
    let path = path.as_ref();
    let img = canvas_to_image(canvas)?;

    img.save(path).map_err(|source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Saved {}x{} image to {}", img.width(), img.height(), path.display());
    Ok(())
}

/// Save a CHW image (such as a scaled image or the mean image).
///
/// # Errors
///
/// Returns an error if the image cannot be saved.
pub fn save_chw<P: AsRef<Path>>(image: ArrayView3<'_, f32>, path: P) -> Result<()> {
    save_grid(image.permuted_axes([1, 2, 0]), path)
}

fn canvas_to_image(canvas: ArrayView3<'_, f32>) -> Result<DynamicImage> {
    let (height, width, channels) = canvas.dim();

    let too_large = || Error::UnsupportedDimensions {
        width,
        height,
        reason: "dimensions do not fit in u32".to_string(),
    };
    let w = u32::try_from(width).map_err(|_| too_large())?;
    let h = u32::try_from(height).map_err(|_| too_large())?;

    let raw: Vec<u8> = canvas.iter().map(|&v| to_u8(v)).collect();

    let img = match channels {
        1 => GrayImage::from_raw(w, h, raw).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(w, h, raw).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(w, h, raw).map(DynamicImage::ImageRgba8),
        _ => {
            return Err(Error::UnsupportedDimensions {
                width,
                height,
                reason: format!("cannot save {channels}-channel image"),
            })
        }
    };

    img.ok_or_else(|| Error::ShapeMismatch {
        expected: format!("{} samples", height * width * channels),
        actual: "buffer too small".to_string(),
    })
}

/// Clamp a sample to `[0, 255]` and truncate to `u8`.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_u8(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    value.clamp(0.0, 255.0) as u8
}

//! Image loading utilities.

use std::path::Path;

use image::DynamicImage;
use ndarray::Array3;

use crate::error::{Error, Result};

use super::Image;

/// Load an image from disk as an HWC array of 8-bit sample values.
///
/// The native channel count is kept: grayscale files give `(H, W, 1)`,
/// grayscale with alpha `(H, W, 2)`, RGB `(H, W, 3)` and RGBA `(H, W, 4)`.
/// Deeper sample formats are reduced to 8 bits.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );

    image_to_array(&img)
}

/// Convert a `DynamicImage` to an HWC array without changing its sample range.
pub(crate) fn image_to_array(img: &DynamicImage) -> Result<Image> {
    let height = img.height() as usize;
    let width = img.width() as usize;
    let channels = usize::from(img.color().channel_count());

    let raw = match channels {
        1 => img.to_luma8().into_raw(),
        2 => img.to_luma_alpha8().into_raw(),
        3 => img.to_rgb8().into_raw(),
        _ => img.to_rgba8().into_raw(),
    };

    let samples: Vec<f32> = raw.into_iter().map(f32::from).collect();

    Array3::from_shape_vec((height, width, channels), samples).map_err(|err| {
        Error::ShapeMismatch {
            expected: format!("({height}, {width}, {channels})"),
            actual: err.to_string(),
        }
    })
}

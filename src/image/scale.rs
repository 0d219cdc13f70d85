//! Short-side resize, centre crop and channel-first reordering.

use image::{imageops::FilterType, ImageBuffer, Rgb};
use ndarray::{s, Array3, ArrayView3};

use crate::error::{Error, Result};

use super::{ChwImage, CROP_SIZE, RGB_CHANNELS, SCALE_SHORT_SIDE};

/// Scale an HWC image to the fixed `(3, 224, 224)` model input.
///
/// The short side is resized to 256 samples with the long side scaled
/// proportionally (integer floor division), the centred 224x224 window is
/// cropped, and the axes are reordered to channel-first. Resampling keeps the
/// input value range: output samples lie within the input's `[min, max]`.
///
/// # Errors
///
/// Returns [`Error::InvalidChannelCount`] if the image does not have exactly
/// three channels, [`Error::UnsupportedDimensions`] if it is empty or too
/// large to resample, and [`Error::NonFiniteSamples`] if its smallest or
/// largest sample is not finite (an all-NaN image, or infinities).
pub fn scale_image(image: ArrayView3<'_, f32>) -> Result<ChwImage> {
    let (height, width, channels) = image.dim();

    if channels != RGB_CHANNELS {
        return Err(Error::InvalidChannelCount {
            channels,
            height,
            width,
        });
    }

    if height == 0 || width == 0 {
        return Err(Error::UnsupportedDimensions {
            width,
            height,
            reason: "image has no samples".to_string(),
        });
    }

    let (low, high) = value_range(image);
    if !(low.is_finite() && high.is_finite()) {
        return Err(Error::NonFiniteSamples { height, width });
    }
    if low == high {
        return Ok(Array3::from_elem((RGB_CHANNELS, CROP_SIZE, CROP_SIZE), low));
    }

    let (new_height, new_width) = scaled_dims(height, width);
    let resized = resize_preserving_range(image, new_height, new_width, low, high)?;

    let top = new_height / 2 - CROP_SIZE / 2;
    let left = new_width / 2 - CROP_SIZE / 2;
    let cropped = resized.slice(s![top..top + CROP_SIZE, left..left + CROP_SIZE, ..]);

    let chw = cropped.permuted_axes([2, 0, 1]).as_standard_layout().into_owned();
    Ok(chw)
}

/// Scale an image, substituting zeros when it cannot be scaled.
///
/// The substitute has the channel-transposed input shape `(C, H, W)`, not
/// `(3, 224, 224)`, and a warning is emitted. Suited to exploratory batch
/// processing where one bad file should not abort a directory scan.
#[must_use]
pub fn scale_image_or_zeros(image: ArrayView3<'_, f32>) -> ChwImage {
    match scale_image(image) {
        Ok(scaled) => scaled,
        Err(err) => {
            let (height, width, channels) = image.dim();
            tracing::warn!("{err}; returning array of zeros");
            Array3::zeros((channels, height, width))
        }
    }
}

/// Dimensions after resizing the short side to [`SCALE_SHORT_SIDE`].
pub(crate) fn scaled_dims(height: usize, width: usize) -> (usize, usize) {
    if height < width {
        (SCALE_SHORT_SIDE, width * SCALE_SHORT_SIDE / height)
    } else {
        (height * SCALE_SHORT_SIDE / width, SCALE_SHORT_SIDE)
    }
}

fn value_range(image: ArrayView3<'_, f32>) -> (f32, f32) {
    image
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Resize through a unit-range float buffer so the image crate's clamping
/// does not cut off samples above 1.0.
fn resize_preserving_range(
    image: ArrayView3<'_, f32>,
    new_height: usize,
    new_width: usize,
    low: f32,
    high: f32,
) -> Result<Array3<f32>> {
    let (height, width, _) = image.dim();
    let span = high - low;

    let to_u32 = |value: usize| {
        u32::try_from(value).map_err(|_| Error::UnsupportedDimensions {
            width,
            height,
            reason: format!("resized dimension {value} does not fit in u32"),
        })
    };

    let unit: Vec<f32> = image.iter().map(|&v| (v - low) / span).collect();
    let buffer: ImageBuffer<Rgb<f32>, Vec<f32>> =
        ImageBuffer::from_raw(to_u32(width)?, to_u32(height)?, unit).ok_or_else(|| {
            Error::ShapeMismatch {
                expected: format!("{} samples", height * width * RGB_CHANNELS),
                actual: "buffer too small".to_string(),
            }
        })?;

    let resized = image::imageops::resize(
        &buffer,
        to_u32(new_width)?,
        to_u32(new_height)?,
        FilterType::Triangle,
    );

    let samples: Vec<f32> = resized
        .into_raw()
        .into_iter()
        .map(|v| v.mul_add(span, low).clamp(low, high))
        .collect();

    Array3::from_shape_vec((new_height, new_width, RGB_CHANNELS), samples).map_err(|err| {
        Error::ShapeMismatch {
            expected: format!("({new_height}, {new_width}, {RGB_CHANNELS})"),
            actual: err.to_string(),
        }
    })
}

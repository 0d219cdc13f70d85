//! Directory-level dataset preparation: mean image and model input batches.

mod files;
mod loader;
mod mean;

pub use files::{image_number, list_image_files, sorted_image_files};
pub use loader::{prep_image, Batch, DatasetBatches, PreparedImage};
pub use mean::{compute_mean_image, MeanImage};

use std::path::Path;

use ndarray::{Array3, ArrayView3};

use crate::error::{Error, Result};
use crate::image::{scale_image, ChwImage, CROP_SIZE, RGB_CHANNELS};

/// What to do with a file whose image the scaler rejects for its channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidImagePolicy {
    /// Warn and use an all-zero `(3, 224, 224)` image in its place.
    #[default]
    Zeros,
    /// Warn and leave the file out where possible.
    Skip,
    /// Stop with the scaler's error.
    Abort,
}

/// Scale one loaded image, applying `policy` to channel-count violations.
///
/// Returns `None` only for [`InvalidImagePolicy::Skip`].
pub(crate) fn scale_with_policy(
    image: ArrayView3<'_, f32>,
    path: &Path,
    policy: InvalidImagePolicy,
) -> Result<Option<ChwImage>> {
    match scale_image(image) {
        Ok(scaled) => Ok(Some(scaled)),
        Err(err @ Error::InvalidChannelCount { .. }) => match policy {
            InvalidImagePolicy::Abort => Err(err),
            InvalidImagePolicy::Zeros => {
                tracing::warn!("{}: {err}; substituting zeros", path.display());
                Ok(Some(Array3::zeros((RGB_CHANNELS, CROP_SIZE, CROP_SIZE))))
            }
            InvalidImagePolicy::Skip => {
                tracing::warn!("{}: {err}; skipping", path.display());
                Ok(None)
            }
        },
        Err(err) => Err(err),
    }
}

/// Subtract a mean from a CHW image.
///
/// `mean` may be a full per-pixel mean of the image's shape or anything that
/// broadcasts to it, such as a `(3, 1, 1)` per-channel mean.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if `mean` does not broadcast to `image`.
pub fn subtract_mean(image: ArrayView3<'_, f32>, mean: ArrayView3<'_, f32>) -> Result<ChwImage> {
    let broadcast = mean
        .broadcast(image.raw_dim())
        .ok_or_else(|| Error::ShapeMismatch {
            expected: format!("mean broadcastable to {:?}", image.shape()),
            actual: format!("{:?}", mean.shape()),
        })?;

    Ok(&image - &broadcast)
}

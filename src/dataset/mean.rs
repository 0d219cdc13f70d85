//! Per-pixel mean over a directory of images.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array3, ArrayView3, Axis};

use crate::error::{Error, Result};
use crate::image::{load_image, ChwImage};

use super::{list_image_files, scale_with_policy, InvalidImagePolicy};

/// Mean of scaled images, shape `(3, 224, 224)`.
#[derive(Debug, Clone)]
pub struct MeanImage {
    pixels: ChwImage,
    count: usize,
}

impl MeanImage {
    /// Wrap an already computed mean of `count` images.
    #[must_use]
    pub fn new(pixels: ChwImage, count: usize) -> Self {
        Self { pixels, count }
    }

    /// Per-pixel mean.
    #[must_use]
    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.pixels.view()
    }

    /// Number of images that went into the mean.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of every channel, shape `(C, 1, 1)`.
    #[must_use]
    pub fn per_channel(&self) -> Array3<f32> {
        let (channels, _, _) = self.pixels.dim();
        Array3::from_shape_fn((channels, 1, 1), |(c, _, _)| {
            self.pixels.index_axis(Axis(0), c).mean().unwrap_or(0.0)
        })
    }

    /// Consume and return the per-pixel mean.
    #[must_use]
    pub fn into_inner(self) -> ChwImage {
        self.pixels
    }
}

/// Compute the mean of every image in `dir` after scaling.
///
/// The first scaled image initialises the accumulator, later ones are added
/// in place, and the sum is divided by the number of images counted.
///
/// # Errors
///
/// Returns an error if the directory or an image cannot be read, if `policy`
/// is [`InvalidImagePolicy::Abort`] and an image is rejected, or if no image
/// was counted.
pub fn compute_mean_image<P: AsRef<Path>>(dir: P, policy: InvalidImagePolicy) -> Result<MeanImage> {
    let dir = dir.as_ref();
    let files = list_image_files(dir)?;

    tracing::info!("Computing mean image over {} files in {}", files.len(), dir.display());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Mean image [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let mut sum: Option<ChwImage> = None;
    let mut count = 0usize;

    for path in &files {
        let image = load_image(path)?;

        if let Some(scaled) = scale_with_policy(image.view(), path, policy)? {
            match sum.as_mut() {
                Some(acc) => *acc += &scaled,
                None => sum = Some(scaled),
            }
            count += 1;
        }

        pb.inc(1);
    }

    pb.finish_with_message("Mean image complete");

    let mut pixels = sum.ok_or_else(|| {
        Error::EmptyBatch(format!("no usable images in {}", dir.display()))
    })?;

    #[allow(clippy::cast_precision_loss)]
    let divisor = count as f32;
    pixels /= divisor;

    tracing::info!("Mean image computed from {count} images");
    Ok(MeanImage::new(pixels, count))
}

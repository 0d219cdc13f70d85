//! Model-ready image tensors and labelled batches from an image directory.

use std::path::{Path, PathBuf};

use ndarray::{s, Array3, Array4, ArrayView3, Axis};

use crate::config::Config;
use crate::error::Result;
use crate::image::{load_image, scale_image, to_u8, CROP_SIZE, RGB_CHANNELS};
use crate::labels::read_validation_labels;

use super::{scale_with_policy, sorted_image_files, subtract_mean, InvalidImagePolicy};

/// A single image prepared for a model.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Scaled image as 8-bit samples, shape `(3, 224, 224)`.
    pub raw: Array3<u8>,
    /// Mean-subtracted input with a batch axis, shape `(1, 3, 224, 224)`.
    pub data: Array4<f32>,
}

/// Load, scale and mean-subtract one image.
///
/// # Errors
///
/// Returns an error if the image cannot be loaded, is not three-channel, or
/// `mean` does not broadcast to `(3, 224, 224)`.
pub fn prep_image<P: AsRef<Path>>(path: P, mean: ArrayView3<'_, f32>) -> Result<PreparedImage> {
    let image = load_image(path.as_ref())?;
    let scaled = scale_image(image.view())?;

    let raw = scaled.mapv(to_u8);
    let data = subtract_mean(scaled.view(), mean)?.insert_axis(Axis(0));

    Ok(PreparedImage { raw, data })
}

/// One batch of model inputs with their labels.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Source files in batch order.
    pub files: Vec<PathBuf>,
    /// Raw 1-indexed labels aligned with `files`.
    pub labels: Vec<u32>,
    /// Mean-subtracted images, shape `(batch_size, 3, 224, 224)`.
    pub data: Array4<f32>,
}

/// Lazy iterator over labelled batches of a validation image directory.
///
/// Files are ordered by their image number and paired with the label file
/// line by line, then both are restricted to `config.lower..config.upper`.
/// Only full batches are produced. Iteration stops after the first error.
#[derive(Debug)]
pub struct DatasetBatches {
    files: Vec<PathBuf>,
    labels: Vec<u32>,
    mean: Array3<f32>,
    batch_size: usize,
    policy: InvalidImagePolicy,
    next_start: usize,
    failed: bool,
}

impl DatasetBatches {
    /// Prepare batches of the images in `dir` labelled by `labels_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the directory or
    /// label file cannot be read, or `mean` does not broadcast to
    /// `(3, 224, 224)`.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        dir: P,
        labels_path: Q,
        mean: ArrayView3<'_, f32>,
        config: &Config,
    ) -> Result<Self> {
        config.validate()?;

        // Fail early on a mean that cannot be subtracted.
        let template = Array3::<f32>::zeros((RGB_CHANNELS, CROP_SIZE, CROP_SIZE));
        subtract_mean(template.view(), mean)?;

        let files = sorted_image_files(dir.as_ref())?;
        let labels = read_validation_labels(labels_path.as_ref(), config.num_classes)?.labels;

        let files = slice_range(files, config.lower, config.upper);
        let labels = slice_range(labels, config.lower, config.upper);

        if files.len() != labels.len() {
            tracing::warn!(
                "{} files but {} labels in range, using the first {}",
                files.len(),
                labels.len(),
                files.len().min(labels.len())
            );
        }
        let usable = files.len().min(labels.len());

        tracing::info!(
            "Loading {} images from {} in batches of {}",
            usable,
            dir.as_ref().display(),
            config.batch_size
        );

        Ok(Self {
            files: files.into_iter().take(usable).collect(),
            labels: labels.into_iter().take(usable).collect(),
            mean: mean.to_owned(),
            batch_size: config.batch_size,
            policy: config.invalid_images,
            next_start: 0,
            failed: false,
        })
    }

    /// Number of full batches this iterator yields in total.
    #[must_use]
    pub fn num_batches(&self) -> usize {
        self.files.len() / self.batch_size
    }

    fn load_batch(&self, start: usize) -> Result<Batch> {
        let end = start + self.batch_size;
        let files = self.files[start..end].to_vec();
        let labels = self.labels[start..end].to_vec();

        tracing::debug!("Batch files: {files:?}");
        tracing::debug!("Batch labels: {labels:?}");

        let mut data = Array4::<f32>::zeros((self.batch_size, RGB_CHANNELS, CROP_SIZE, CROP_SIZE));

        for (idx, path) in files.iter().enumerate() {
            let image = load_image(path)?;

            // A skipped image keeps its all-zero slot so labels stay aligned.
            if let Some(scaled) = scale_with_policy(image.view(), path, self.policy)? {
                let centred = subtract_mean(scaled.view(), self.mean.view())?;
                data.slice_mut(s![idx, .., .., ..]).assign(&centred);
            }
        }

        Ok(Batch {
            files,
            labels,
            data,
        })
    }
}

impl Iterator for DatasetBatches {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next_start + self.batch_size > self.files.len() {
            return None;
        }

        let start = self.next_start;
        self.next_start += self.batch_size;

        let batch = self.load_batch(start);
        if batch.is_err() {
            self.failed = true;
        }
        Some(batch)
    }
}

fn slice_range<T>(items: Vec<T>, lower: usize, upper: Option<usize>) -> Vec<T> {
    let len = items.len();
    let upper = upper.unwrap_or(len).min(len);
    let lower = lower.min(upper);
    items.into_iter().skip(lower).take(upper - lower).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use approx::assert_abs_diff_eq;
    use image::{GrayImage, Rgb, RgbImage};
    use std::fs;

    fn write_rgb(dir: &Path, name: &str, value: u8) {
        RgbImage::from_pixel(256, 300, Rgb([value, value, value]))
            .save(dir.join(name))
            .unwrap();
    }

    /// Images numbered 1..=n with value 10 * number, labels 100 + number.
    fn fixture(n: u8) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let images = root.path().join("images");
        fs::create_dir(&images).unwrap();
        let mut labels = String::new();
        for i in 1..=n {
            write_rgb(&images, &format!("ILSVRC2012_val_{i:08}.png"), 10 * i);
            labels.push_str(&format!("{}\n", 100 + u32::from(i)));
        }
        fs::write(root.path().join("labels.txt"), labels).unwrap();
        root
    }

    fn config(batch_size: usize) -> Config {
        Config {
            batch_size,
            ..Config::default()
        }
    }

    #[test]
    fn test_prep_image() {
        let dir = tempfile::tempdir().unwrap();
        write_rgb(dir.path(), "x.png", 50);
        let mean = Array3::<f32>::from_elem((3, 1, 1), 20.0);

        let prepared = prep_image(dir.path().join("x.png"), mean.view()).unwrap();
        assert_eq!(prepared.raw.shape(), &[3, 224, 224]);
        assert_eq!(prepared.raw[[1, 10, 10]], 50);
        assert_eq!(prepared.data.shape(), &[1, 3, 224, 224]);
        assert_abs_diff_eq!(prepared.data[[0, 2, 100, 100]], 30.0, epsilon = 1e-4);
    }

    #[test]
    fn test_batches_in_numeric_order() {
        let root = fixture(5);
        let mean = Array3::<f32>::zeros((3, 224, 224));

        let batches: Vec<Batch> = DatasetBatches::new(
            root.path().join("images"),
            root.path().join("labels.txt"),
            mean.view(),
            &config(2),
        )
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].labels, vec![101, 102]);
        assert_eq!(batches[1].labels, vec![103, 104]);
        assert_eq!(batches[1].data.shape(), &[2, 3, 224, 224]);
        assert_abs_diff_eq!(batches[0].data[[0, 0, 0, 0]], 10.0, epsilon = 1e-4);
        assert_abs_diff_eq!(batches[1].data[[1, 2, 50, 50]], 40.0, epsilon = 1e-4);
    }

    #[test]
    fn test_range_and_mean() {
        let root = fixture(6);
        let mean = Array3::<f32>::from_elem((3, 1, 1), 5.0);
        let config = Config {
            batch_size: 2,
            lower: 2,
            upper: Some(5),
            ..Config::default()
        };

        let mut batches = DatasetBatches::new(
            root.path().join("images"),
            root.path().join("labels.txt"),
            mean.view(),
            &config,
        )
        .unwrap();
        assert_eq!(batches.num_batches(), 1);

        let batch = batches.next().unwrap().unwrap();
        assert_eq!(batch.labels, vec![103, 104]);
        assert!(batch.files[0].ends_with("ILSVRC2012_val_00000003.png"));
        assert_abs_diff_eq!(batch.data[[0, 1, 7, 7]], 25.0, epsilon = 1e-4);
    }

    #[test]
    fn test_grayscale_file_zeros_and_skip() {
        let root = fixture(1);
        GrayImage::new(260, 260)
            .save(root.path().join("images").join("ILSVRC2012_val_00000002.png"))
            .unwrap();
        fs::write(root.path().join("labels.txt"), "1\n2\n").unwrap();
        let mean = Array3::<f32>::from_elem((3, 1, 1), 5.0);

        let first_batch = |policy| {
            let config = Config {
                batch_size: 2,
                invalid_images: policy,
                ..Config::default()
            };
            DatasetBatches::new(
                root.path().join("images"),
                root.path().join("labels.txt"),
                mean.view(),
                &config,
            )
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
        };

        // Zeros: the substitute image is mean-subtracted like any other.
        let zeros = first_batch(InvalidImagePolicy::Zeros);
        assert_eq!(zeros.labels, vec![1, 2]);
        assert!(zeros.data.slice(s![1, .., .., ..]).iter().all(|&v| v == -5.0));
        assert_abs_diff_eq!(zeros.data[[0, 0, 0, 0]], 5.0, epsilon = 1e-4);

        // Skip: the slot is left empty but the label stays in place.
        let skipped = first_batch(InvalidImagePolicy::Skip);
        assert_eq!(skipped.labels, vec![1, 2]);
        assert!(skipped.files[1].ends_with("ILSVRC2012_val_00000002.png"));
        assert!(skipped.data.slice(s![1, .., .., ..]).iter().all(|&v| v == 0.0));
        assert_abs_diff_eq!(skipped.data[[0, 0, 0, 0]], 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_abort_policy_stops_iteration() {
        let root = fixture(1);
        GrayImage::new(260, 260)
            .save(root.path().join("images").join("ILSVRC2012_val_00000002.png"))
            .unwrap();
        fs::write(root.path().join("labels.txt"), "1\n2\n3\n").unwrap();
        write_rgb(&root.path().join("images"), "ILSVRC2012_val_00000003.png", 1);
        let mean = Array3::<f32>::zeros((3, 224, 224));
        let config = Config {
            batch_size: 1,
            invalid_images: InvalidImagePolicy::Abort,
            ..Config::default()
        };

        let mut batches = DatasetBatches::new(
            root.path().join("images"),
            root.path().join("labels.txt"),
            mean.view(),
            &config,
        )
        .unwrap();

        assert!(batches.next().unwrap().is_ok());
        assert!(matches!(
            batches.next(),
            Some(Err(Error::InvalidChannelCount { .. }))
        ));
        assert!(batches.next().is_none());
    }

    #[test]
    fn test_bad_mean_rejected() {
        let root = fixture(2);
        let mean = Array3::<f32>::zeros((3, 10, 10));
        assert!(matches!(
            DatasetBatches::new(
                root.path().join("images"),
                root.path().join("labels.txt"),
                mean.view(),
                &config(1),
            ),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_slice_range() {
        assert_eq!(slice_range(vec![1, 2, 3, 4], 1, Some(3)), vec![2, 3]);
        assert_eq!(slice_range(vec![1, 2, 3, 4], 2, None), vec![3, 4]);
        assert_eq!(slice_range(vec![1, 2], 1, Some(10)), vec![2]);
        assert!(slice_range(vec![1, 2], 5, None).is_empty());
    }
}

//! End-to-end tests over the public API.
//!
//! These cover the documented scenarios:
//! - scaling a tall image to the model input shape
//! - the zero fallback for non-RGB images
//! - a two-image grid with padding
//! - mean image and labelled batches from a directory on disk

use std::fs;
use std::path::Path;

use approx::assert_abs_diff_eq;
use image::{Rgb, RgbImage};
use ndarray::{s, Array2, Array3, Array4, Axis};

use convprep::dataset::{self, DatasetBatches, InvalidImagePolicy};
use convprep::grid::{self, GridOptions};
use convprep::{labels, Config, Error};

#[allow(clippy::cast_precision_loss)]
fn noise_image(height: usize, width: usize) -> Array3<f32> {
    Array3::from_shape_fn((height, width, 3), |(y, x, c)| {
        ((y * 31 + x * 17 + c * 5) % 251) as f32
    })
}

#[test]
fn test_tall_image_scales_to_model_input() {
    let img = noise_image(300, 150);
    let scaled = convprep::scale_image(img.view()).expect("scaling failed");

    assert_eq!(scaled.shape(), &[3, 224, 224]);
    assert!(scaled.iter().all(|&v| (0.0..=250.0).contains(&v)));
}

#[test]
fn test_single_channel_falls_back_to_zeros() {
    let img = Array3::<f32>::from_elem((100, 200, 1), 9.0);

    let err = convprep::scale_image(img.view()).unwrap_err();
    assert!(matches!(err, Error::InvalidChannelCount { channels: 1, .. }));

    let zeros = convprep::image::scale_image_or_zeros(img.view());
    assert_eq!(zeros.shape(), &[1, 100, 200]);
    assert!(zeros.iter().all(|&v| v == 0.0));
}

#[test]
fn test_two_image_grid() {
    let mut batch = Array4::<f32>::zeros((2, 2, 2, 1));
    batch.slice_mut(s![0, .., .., 0]).assign(&Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 5.0]).unwrap());
    batch.slice_mut(s![1, .., .., 0]).assign(&Array2::from_shape_vec((2, 2), vec![-4.0, 0.0, 0.0, 4.0]).unwrap());

    let canvas = convprep::visualize_grid(batch.view(), &GridOptions::default()).unwrap();
    assert_eq!(canvas.dim(), (5, 5, 1));

    assert_abs_diff_eq!(canvas[[0, 0, 0]], 0.0);
    assert_abs_diff_eq!(canvas[[1, 0, 0]], 127.5, epsilon = 1e-4);
    assert_abs_diff_eq!(canvas[[1, 1, 0]], 255.0, epsilon = 1e-4);

    assert_abs_diff_eq!(canvas[[0, 3, 0]], 0.0);
    assert_abs_diff_eq!(canvas[[0, 4, 0]], 127.5, epsilon = 1e-4);
    assert_abs_diff_eq!(canvas[[1, 4, 0]], 255.0, epsilon = 1e-4);

    assert!(canvas.slice(s![3.., .., ..]).iter().all(|&v| v == 0.0));
}

#[test]
#[allow(clippy::cast_precision_loss)]
fn test_filter_grid_saves_as_picture() {
    let weights = Array2::from_shape_fn((8 * 8 * 3, 10), |(row, k)| ((row * 3 + k * 11) % 97) as f32 - 48.0);
    let canvas = grid::filter_grid(weights.view(), 8, 8, 3).unwrap();
    assert_eq!(canvas.dim(), (8 * 4 + 3 * 3, 8 * 4 + 3 * 3, 3));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filters.png");
    convprep::image::save_grid(canvas.view(), &path).unwrap();

    let reloaded = convprep::image::load_image(&path).unwrap();
    assert_eq!(reloaded.shape(), &[41, 41, 3]);
}

fn write_dataset(root: &Path) {
    let images = root.join("val");
    fs::create_dir(&images).unwrap();

    for (num, value) in [(3u32, 60u8), (1, 20), (2, 40), (4, 80)] {
        RgbImage::from_pixel(320, 240, Rgb([value, value / 2, 0]))
            .save(images.join(format!("ILSVRC2012_val_{num:08}.png")))
            .unwrap();
    }

    fs::write(root.join("ground_truth.txt"), "5\n6\n7\n8\n").unwrap();
}

#[test]
fn test_mean_then_batches() {
    let root = tempfile::tempdir().unwrap();
    write_dataset(root.path());
    let images = root.path().join("val");

    let mean = dataset::compute_mean_image(&images, InvalidImagePolicy::Abort).unwrap();
    assert_eq!(mean.count(), 4);
    assert_abs_diff_eq!(mean.view()[[0, 112, 112]], 50.0, epsilon = 1e-3);

    let config = Config {
        batch_size: 2,
        ..Config::default()
    };
    let batches: Vec<_> = DatasetBatches::new(&images, root.path().join("ground_truth.txt"), mean.view(), &config)
        .unwrap()
        .collect::<convprep::Result<_>>()
        .unwrap();

    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].labels, vec![5, 6]);
    assert_eq!(batches[1].labels, vec![7, 8]);

    // Image 1 has red 20 against a mean of 50.
    assert_abs_diff_eq!(batches[0].data[[0, 0, 10, 10]], -30.0, epsilon = 1e-3);
    // Image 4 has red 80.
    assert_abs_diff_eq!(batches[1].data[[1, 0, 10, 10]], 30.0, epsilon = 1e-3);

    let centred = batches[0].data.index_axis(Axis(0), 1);
    assert_abs_diff_eq!(centred[[2, 0, 0]], 0.0, epsilon = 1e-3);
}

#[test]
fn test_labels_feed_one_hot() {
    let root = tempfile::tempdir().unwrap();
    write_dataset(root.path());

    let parsed = labels::read_validation_labels(root.path().join("ground_truth.txt"), 10).unwrap();
    assert_eq!(parsed.labels, vec![5, 6, 7, 8]);
    assert_eq!(parsed.one_hot.sum_axis(Axis(1)).to_vec(), vec![1.0; 4]);
    assert_eq!(parsed.one_hot[[3, 7]], 1.0);
}

//! # convprep
//!
//! Preprocessing and visualization helpers for ILSVRC-style image
//! classification experiments.
//!
//! - [`scale_image`] resizes an RGB image so its short side is 256, crops the
//!   centred 224x224 window and reorders it to channel-first.
//! - [`visualize_grid`] tiles a batch of images into one canvas, stretching
//!   every tile to `[0, ubound]` on its own, for looking at learned filters.
//! - [`dataset`] computes mean images and loads labelled, mean-subtracted
//!   batches from a validation directory.
//!
//! ## Example
//!
//! ```no_run
//! use convprep::{grid, image};
//!
//! # fn main() -> convprep::Result<()> {
//! let img = image::load_image("ILSVRC2012_val_00000001.JPEG")?;
//! let scaled = image::scale_image(img.view())?;
//! assert_eq!(scaled.shape(), &[3, 224, 224]);
//!
//! let batch = scaled.permuted_axes([1, 2, 0]).insert_axis(ndarray::Axis(0));
//! let canvas = grid::visualize_grid(batch.view(), &grid::GridOptions::default())?;
//! image::save_grid(canvas.view(), "grid.png")?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod image;
pub mod labels;
pub mod mapping;

pub use config::Config;
pub use error::{Error, Result};
pub use grid::{visualize_grid, GridOptions};
pub use image::scale_image;

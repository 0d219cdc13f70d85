//! Image loading, scaling, and saving utilities.

mod load;
mod save;
mod scale;

pub use load::load_image;
pub use save::{save_chw, save_grid};
pub(crate) use save::to_u8;
pub use scale::{scale_image, scale_image_or_zeros};

use ndarray::Array3;

/// Image in HWC format (row, column, channel) with raw sample values.
pub type Image = Array3<f32>;

/// Image in CHW format (channel, row, column), as produced by [`scale_image`].
pub type ChwImage = Array3<f32>;

/// Target length of the short side before cropping.
pub const SCALE_SHORT_SIDE: usize = 256;

/// Side of the square centre crop.
pub const CROP_SIZE: usize = 224;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

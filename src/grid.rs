//! Tiling image batches into a square grid for visualization.
//!
//! Each tile is contrast-stretched on its own, so a filter with tiny weights
//! shows up as strongly as one with large weights.

use ndarray::{s, Array3, Array4, ArrayView2, ArrayView3, ArrayView4, ArrayViewMut3};

use crate::error::{Error, Result};

/// Default upper bound of the normalized tile range.
pub const DEFAULT_UBOUND: f32 = 255.0;

/// Default number of blank samples between grid cells.
pub const DEFAULT_PADDING: usize = 1;

/// Padding used for filter weight grids.
pub const FILTER_GRID_PADDING: usize = 3;

/// What to draw for a tile whose samples are all equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateTile {
    /// Fill the tile with `ubound / 2`.
    #[default]
    MidGray,
    /// Leave the tile at zero.
    Zero,
    /// Fail with [`Error::DegenerateTileRange`].
    Error,
}

/// Options for [`visualize_grid`].
#[derive(Debug, Clone)]
pub struct GridOptions {
    /// Tiles are scaled to `[0, ubound]`.
    pub ubound: f32,

    /// Blank samples between neighbouring cells.
    pub padding: usize,

    /// Policy for constant-valued tiles.
    pub degenerate: DegenerateTile,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            ubound: DEFAULT_UBOUND,
            padding: DEFAULT_PADDING,
            degenerate: DegenerateTile::default(),
        }
    }
}

impl GridOptions {
    /// Validate the options.
    ///
    /// # Errors
    ///
    /// Returns an error if `ubound` is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if !(self.ubound.is_finite() && self.ubound > 0.0) {
            return Err(Error::InvalidParameter {
                name: "ubound".to_string(),
                reason: "must be a positive finite number".to_string(),
            });
        }

        Ok(())
    }
}

/// Number of cells per grid side: `ceil(sqrt(n))`.
#[must_use]
pub fn grid_size(n: usize) -> usize {
    let mut size = n.isqrt();
    if size * size < n {
        size += 1;
    }
    size
}

/// Arrange `(N, H, W, C)` images into one `(height, width, C)` canvas.
///
/// The canvas has `ceil(sqrt(N))` cells per side separated by `padding`
/// blank samples. Cells are filled row by row in input order; cells past the
/// last image stay zero. Every tile is rescaled on its own to `[0, ubound]`.
///
/// # Errors
///
/// Returns an error if the batch is empty, the options are invalid, or a
/// constant tile is met under [`DegenerateTile::Error`].
pub fn visualize_grid(images: ArrayView4<'_, f32>, options: &GridOptions) -> Result<Array3<f32>> {
    options.validate()?;

    let (n, height, width, channels) = images.dim();
    if n == 0 {
        return Err(Error::EmptyBatch("no images to tile".to_string()));
    }

    let size = grid_size(n);
    let padding = options.padding;
    let grid_height = height * size + padding * (size - 1);
    let grid_width = width * size + padding * (size - 1);

    tracing::debug!(
        "Tiling {n} images of {height}x{width}x{channels} into a {size}x{size} grid ({grid_height}x{grid_width})"
    );

    let mut grid = Array3::<f32>::zeros((grid_height, grid_width, channels));

    let mut next_idx = 0;
    let mut y0 = 0;
    for _ in 0..size {
        let mut x0 = 0;
        for _ in 0..size {
            if next_idx < n {
                let tile = grid.slice_mut(s![y0..y0 + height, x0..x0 + width, ..]);
                fill_tile(tile, images.index_axis(ndarray::Axis(0), next_idx), next_idx, options)?;
                next_idx += 1;
            }
            x0 += width + padding;
        }
        y0 += height + padding;
    }

    Ok(grid)
}

fn fill_tile(
    mut tile: ArrayViewMut3<'_, f32>,
    image: ArrayView3<'_, f32>,
    index: usize,
    options: &GridOptions,
) -> Result<()> {
    match normalize_tile(image, options.ubound) {
        Ok(normalized) => tile.assign(&normalized),
        Err(value) => {
            tracing::debug!("Tile {index} has zero dynamic range ({value})");
            match options.degenerate {
                DegenerateTile::MidGray => tile.fill(options.ubound / 2.0),
                DegenerateTile::Zero => tile.fill(0.0),
                DegenerateTile::Error => return Err(Error::DegenerateTileRange { index, value }),
            }
        }
    }

    Ok(())
}

/// Rescale one image to `[0, ubound]` using its own min and max.
///
/// Returns the constant sample value as the error when the image has no
/// usable dynamic range (all samples equal, or non-finite extrema).
pub fn normalize_tile(image: ArrayView3<'_, f32>, ubound: f32) -> std::result::Result<Array3<f32>, f32> {
    let (low, high) = image
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let range = high - low;
    if !(range.is_finite() && range > 0.0) {
        return Err(low);
    }

    Ok(image.mapv(|v| ((v - low) / range * ubound).clamp(0.0, ubound)))
}

/// Reshape a `(height * width * channels, K)` weight matrix into `K` images.
///
/// Row `(y * width + x) * channels + c` of the matrix holds sample `(y, x, c)`
/// of every filter, the layout of a first fully connected or convolutional
/// layer over flattened HWC inputs. The result has shape
/// `(K, height, width, channels)`.
///
/// # Errors
///
/// Returns an error if the row count does not match the requested shape.
pub fn weights_to_images(
    weights: ArrayView2<'_, f32>,
    height: usize,
    width: usize,
    channels: usize,
) -> Result<Array4<f32>> {
    let (rows, filters) = weights.dim();
    if rows != height * width * channels {
        return Err(Error::ShapeMismatch {
            expected: format!("{} rows ({height}x{width}x{channels})", height * width * channels),
            actual: format!("{rows} rows"),
        });
    }

    let samples: Vec<f32> = weights.iter().copied().collect();
    let hwck = Array4::from_shape_vec((height, width, channels, filters), samples).map_err(
        |err| Error::ShapeMismatch {
            expected: format!("({height}, {width}, {channels}, {filters})"),
            actual: err.to_string(),
        },
    )?;

    let khwc = hwck.permuted_axes([3, 0, 1, 2]).as_standard_layout().into_owned();
    Ok(khwc)
}

/// Build the filter visualization canvas for a first-layer weight matrix.
///
/// # Errors
///
/// Returns an error if the weights cannot be reshaped or tiled.
pub fn filter_grid(
    weights: ArrayView2<'_, f32>,
    height: usize,
    width: usize,
    channels: usize,
) -> Result<Array3<f32>> {
    let filters = weights_to_images(weights, height, width, channels)?;
    let options = GridOptions {
        padding: FILTER_GRID_PADDING,
        ..GridOptions::default()
    };
    visualize_grid(filters.view(), &options)
}

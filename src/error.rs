//! Custom error types for convprep.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the convprep library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The scaler only accepts three-channel images.
    #[error("image {height}x{width} has {channels} channels, expected 3")]
    InvalidChannelCount {
        channels: usize,
        height: usize,
        width: usize,
    },

    /// Image dimensions are not supported.
    #[error("unsupported image dimensions {width}x{height}: {reason}")]
    UnsupportedDimensions {
        width: usize,
        height: usize,
        reason: String,
    },

    /// Samples have no finite range to resample over.
    #[error("image {height}x{width} has no finite sample range")]
    NonFiniteSamples { height: usize, width: usize },

    /// A grid tile has no dynamic range to stretch.
    #[error("tile {index} is constant ({value}), cannot normalize")]
    DegenerateTileRange { index: usize, value: f32 },

    /// Nothing to process.
    #[error("empty input: {0}")]
    EmptyBatch(String),

    /// Malformed line in a label or mapping file.
    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// File name does not carry an image number.
    #[error("cannot extract image number from {path}: {reason}")]
    InvalidFileName { path: PathBuf, reason: String },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

/// Result type alias for convprep operations.
pub type Result<T> = std::result::Result<T, Error>;

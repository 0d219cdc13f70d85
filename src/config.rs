//! Dataset loading configuration.

use crate::dataset::InvalidImagePolicy;
use crate::error::{Error, Result};
use crate::labels::ILSVRC_NUM_CLASSES;

/// Configuration for [`DatasetBatches`](crate::dataset::DatasetBatches).
#[derive(Debug, Clone)]
pub struct Config {
    /// Images per batch.
    pub batch_size: usize,

    /// Width of the one-hot label encoding; labels must lie in `1..=num_classes`.
    pub num_classes: usize,

    /// First file (in image number order) to use.
    pub lower: usize,

    /// One past the last file to use. None for all remaining files.
    pub upper: Option<usize>,

    /// Handling of images the scaler rejects.
    pub invalid_images: InvalidImagePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: 50,
            num_classes: ILSVRC_NUM_CLASSES,
            lower: 0,
            upper: None,
            invalid_images: InvalidImagePolicy::default(),
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidParameter {
                name: "batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.num_classes == 0 {
            return Err(Error::InvalidParameter {
                name: "num_classes".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if let Some(upper) = self.upper {
            if upper < self.lower {
                return Err(Error::InvalidParameter {
                    name: "upper".to_string(),
                    reason: format!("must not be below lower ({})", self.lower),
                });
            }
        }

        Ok(())
    }
}

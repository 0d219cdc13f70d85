//! convprep CLI - prepare ILSVRC-style images and visualize filters.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ndarray::{Array3, Axis};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use convprep::dataset::{self, DatasetBatches, InvalidImagePolicy};
use convprep::grid::{self, DegenerateTile, GridOptions};
use convprep::{image, Config};

/// Image preprocessing and filter visualization for classification experiments.
#[derive(Parser, Debug)]
#[command(name = "convprep")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scale one image to 224x224 (short side 256, centre crop) and save it.
    Scale {
        /// Input image path.
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output image path.
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Compute the mean of all scaled images in a directory.
    Mean {
        /// Directory of images.
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Save the mean image as a picture.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// What to do with images that are not three-channel.
        #[arg(long, value_enum, default_value_t = Policy::Zeros)]
        invalid: Policy,
    },

    /// Tile images of identical size into one grid picture.
    Grid {
        /// Input images, tiled in the given order.
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output image path.
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,

        /// Upper bound of the per-tile value range.
        #[arg(long, default_value_t = grid::DEFAULT_UBOUND, value_name = "FLOAT")]
        ubound: f32,

        /// Blank pixels between tiles.
        #[arg(short, long, default_value_t = grid::DEFAULT_PADDING, value_name = "INT")]
        padding: usize,

        /// How to draw constant-valued tiles.
        #[arg(long, value_enum, default_value_t = Degenerate::MidGray)]
        degenerate: Degenerate,
    },

    /// Load labelled, mean-subtracted batches from a validation directory.
    Batches {
        /// Directory of numbered validation images.
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Ground-truth label file, one label per line.
        #[arg(value_name = "LABELS")]
        labels: PathBuf,

        /// Images per batch.
        #[arg(short, long, default_value = "50", value_name = "INT")]
        batch_size: usize,

        /// First image (in image number order) to load.
        #[arg(long, default_value = "0", value_name = "INT")]
        lower: usize,

        /// One past the last image to load.
        #[arg(long, value_name = "INT")]
        upper: Option<usize>,

        /// Per-channel mean to subtract instead of computing the mean image.
        #[arg(long, num_args = 3, value_names = ["R", "G", "B"])]
        channel_mean: Option<Vec<f32>>,

        /// What to do with images that are not three-channel.
        #[arg(long, value_enum, default_value_t = Policy::Zeros)]
        invalid: Policy,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Policy {
    Zeros,
    Skip,
    Abort,
}

impl From<Policy> for InvalidImagePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Zeros => Self::Zeros,
            Policy::Skip => Self::Skip,
            Policy::Abort => Self::Abort,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Degenerate {
    MidGray,
    Zero,
    Error,
}

impl From<Degenerate> for DegenerateTile {
    fn from(value: Degenerate) -> Self {
        match value {
            Degenerate::MidGray => Self::MidGray,
            Degenerate::Zero => Self::Zero,
            Degenerate::Error => Self::Error,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("convprep={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(args.command) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Scale { input, output } => {
            let img = image::load_image(&input)?;
            let scaled = image::scale_image(img.view())
                .with_context(|| format!("Failed to scale {}", input.display()))?;
            image::save_chw(scaled.view(), &output)?;
        }

        Command::Mean {
            dir,
            output,
            invalid,
        } => {
            let mean = dataset::compute_mean_image(&dir, invalid.into())
                .context("Failed to compute mean image")?;

            let channels = mean.per_channel();
            println!(
                "Mean of {} images: R {:.3}  G {:.3}  B {:.3}",
                mean.count(),
                channels[[0, 0, 0]],
                channels[[1, 0, 0]],
                channels[[2, 0, 0]]
            );

            if let Some(output) = output {
                image::save_chw(mean.view(), &output)?;
            }
        }

        Command::Grid {
            inputs,
            output,
            ubound,
            padding,
            degenerate,
        } => {
            let images = inputs
                .iter()
                .map(image::load_image)
                .collect::<convprep::Result<Vec<_>>>()?;
            let views: Vec<_> = images.iter().map(|img| img.view()).collect();
            let batch = ndarray::stack(Axis(0), &views)
                .context("Grid inputs must all have the same size and channel count")?;

            let options = GridOptions {
                ubound,
                padding,
                degenerate: degenerate.into(),
            };
            let canvas = grid::visualize_grid(batch.view(), &options)?;
            image::save_grid(canvas.view(), &output)?;
        }

        Command::Batches {
            dir,
            labels,
            batch_size,
            lower,
            upper,
            channel_mean,
            invalid,
        } => {
            let config = Config {
                batch_size,
                lower,
                upper,
                invalid_images: invalid.into(),
                ..Config::default()
            };
            config.validate()?;

            let mean = match channel_mean {
                Some(values) => Array3::from_shape_vec((3, 1, 1), values)
                    .context("Channel mean needs three values")?,
                None => dataset::compute_mean_image(&dir, config.invalid_images)
                    .context("Failed to compute mean image")?
                    .into_inner(),
            };

            let batches = DatasetBatches::new(&dir, &labels, mean.view(), &config)?;
            let total = batches.num_batches();

            for (idx, batch) in batches.enumerate() {
                let batch = batch.with_context(|| format!("Failed to load batch {idx}"))?;
                tracing::info!(
                    "Batch {}/{}: {} images, labels {:?}, mean {:.3}",
                    idx + 1,
                    total,
                    batch.files.len(),
                    batch.labels,
                    batch.data.mean().unwrap_or(0.0)
                );
            }

            println!("Loaded {total} batches of {batch_size} images");
        }
    }

    Ok(())
}

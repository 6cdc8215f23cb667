//! Normalizes freehand stylus captures into MNIST-style classifier input.
//!
//! A capture goes through grayscale conversion, a tight crop around the ink,
//! a bicubic stretch to 28x28, polarity inversion and finally packing into a
//! stride-28 buffer. See [`preprocessing::Pipeline`].

pub mod classifier;
pub mod config;
pub mod error;
pub mod preprocessing;
pub mod raster;
pub mod server;

pub use classifier::{Classifier, Prediction, Recognizer};
pub use error::{ApiError, PipelineError};
pub use preprocessing::{NormalizedBuffer, Pipeline, PipelineOptions, ResampleFilter};
pub use raster::{BoundingBox, RasterImage};

#[derive(clap::Parser, Debug)]
#[command(name = "scribo-normalizer-server")]
#[command(about = "Normalizes handwritten digit captures for a 28x28 classifier")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "SCRIBO_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SCRIBO_PORT", default_value = "9393")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 10MB)
    #[arg(long, env = "SCRIBO_MAX_FILE_SIZE", default_value = "10485760")]
    pub max_file_size: usize,

    /// Resampling filter (catmull-rom, lanczos3, gaussian, triangle)
    #[arg(long, env = "SCRIBO_FILTER", default_value = "catmull-rom")]
    pub filter: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

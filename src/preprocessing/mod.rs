//! Image normalization for the digit classifier
//!
//! Turns a freehand capture into the 28x28 inverted grayscale buffer the
//! classifier was trained on.

pub mod pipeline;
pub mod steps;

pub use pipeline::{NormalizationResult, Pipeline, PipelineOptions, Stage, StepTiming};
pub use steps::pack::{NormalizedBuffer, MODEL_INPUT_SIZE};
pub use steps::resize::ResampleFilter;

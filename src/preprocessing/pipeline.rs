use crate::error::PipelineError;
use crate::raster::{BoundingBox, RasterImage};
use serde::Serialize;
use std::time::Instant;

use super::steps;
use super::steps::pack::{NormalizedBuffer, MODEL_INPUT_SIZE};
use super::steps::resize::ResampleFilter;

/// Where a run currently stands. Transitions are strictly sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    Grayscaled,
    Cropped,
    Resized,
    Inverted,
    /// Terminal success
    Packed,
}

impl Stage {
    /// The stage reached after the next step succeeds
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Start => Some(Stage::Grayscaled),
            Stage::Grayscaled => Some(Stage::Cropped),
            Stage::Cropped => Some(Stage::Resized),
            Stage::Resized => Some(Stage::Inverted),
            Stage::Inverted => Some(Stage::Packed),
            Stage::Packed => None,
        }
    }

    /// Name of the step that enters this stage
    pub fn step_name(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Grayscaled => "grayscale",
            Stage::Cropped => "crop",
            Stage::Resized => "resize",
            Stage::Inverted => "invert",
            Stage::Packed => "pack",
        }
    }
}

/// Timing information for a single step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Knobs that do not change the output contract
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub filter: ResampleFilter,
}

/// Output of a successful run, with timing stats
#[derive(Debug, Clone, Serialize)]
pub struct NormalizationResult {
    pub buffer: NormalizedBuffer,
    pub bounding_box: BoundingBox,
    pub filter: ResampleFilter,
    pub total_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

/// Grayscale, crop, resize, invert and pack, in that order.
///
/// The first failing step ends the run; nothing is retried or substituted.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Normalize a captured image into classifier input
    pub fn process(&self, image: &RasterImage) -> Result<NormalizationResult, PipelineError> {
        let start = Instant::now();
        let mut run = Run {
            stage: Stage::Start,
            timings: Vec::with_capacity(5),
        };

        let gray = run.step(Stage::Grayscaled, || steps::grayscale::apply(image))?;
        let (cropped, bounding_box) = run.step(Stage::Cropped, || steps::crop::apply(&gray))?;
        drop(gray);
        let resized = run.step(Stage::Resized, || {
            steps::resize::apply(
                &cropped,
                MODEL_INPUT_SIZE,
                MODEL_INPUT_SIZE,
                self.options.filter,
            )
        })?;
        drop(cropped);
        let inverted = run.step(Stage::Inverted, || steps::invert::apply(&resized))?;
        let buffer = run.step(Stage::Packed, || steps::pack::apply(&inverted))?;

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            "normalized {}x{} capture, ink box {:?}, in {}ms",
            image.width(),
            image.height(),
            bounding_box,
            total_time_ms
        );

        Ok(NormalizationResult {
            buffer,
            bounding_box,
            filter: self.options.filter,
            total_time_ms,
            steps: run.timings,
        })
    }
}

struct Run {
    stage: Stage,
    timings: Vec<StepTiming>,
}

impl Run {
    /// Run the step that moves the pipeline into `next`
    fn step<T, F>(&mut self, next: Stage, step_fn: F) -> Result<T, PipelineError>
    where
        F: FnOnce() -> Result<T, PipelineError>,
    {
        debug_assert_eq!(self.stage.next(), Some(next), "steps must run in order");
        let name = next.step_name();

        let step_start = Instant::now();
        let output = step_fn().inspect_err(|e| {
            tracing::warn!(stage = ?self.stage, step = name, "normalization failed: {}", e);
        })?;

        self.timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        tracing::debug!(from = ?self.stage, to = ?next, "step {} done", name);
        self.stage = next;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas_with_ink(width: u32, height: u32, ink: &[(u32, u32)]) -> RasterImage {
        let mut data = vec![255u8; (width * height) as usize];
        for &(x, y) in ink {
            data[(y * width + x) as usize] = 0;
        }
        RasterImage::packed(width, height, 1, data).unwrap()
    }

    #[test]
    fn test_stage_order() {
        let mut stage = Stage::Start;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(
            seen,
            vec![
                Stage::Start,
                Stage::Grayscaled,
                Stage::Cropped,
                Stage::Resized,
                Stage::Inverted,
                Stage::Packed
            ]
        );
    }

    #[test]
    fn test_process_records_every_step() {
        let img = canvas_with_ink(40, 40, &[(10, 10), (30, 20)]);
        let result = Pipeline::default().process(&img).unwrap();

        let names: Vec<&str> = result.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["grayscale", "crop", "resize", "invert", "pack"]);
        assert_eq!(result.buffer.as_bytes().len(), 784);
        assert_eq!(result.filter, ResampleFilter::CatmullRom);
    }

    #[test]
    fn test_process_stops_at_empty_canvas() {
        let img = canvas_with_ink(20, 20, &[]);
        let err = Pipeline::default().process(&img).unwrap_err();
        assert_eq!(err, PipelineError::EmptyCanvas);
    }

    #[test]
    fn test_failed_step_keeps_stage_and_skips_timing() {
        let mut run = Run {
            stage: Stage::Grayscaled,
            timings: vec![],
        };
        let err = run
            .step(Stage::Cropped, || Err::<(), _>(PipelineError::EmptyCanvas))
            .unwrap_err();
        assert_eq!(err, PipelineError::EmptyCanvas);
        assert_eq!(run.stage, Stage::Grayscaled);
        assert!(run.timings.is_empty());
    }

    #[test]
    fn test_step_advances_and_records_timing() {
        let mut run = Run {
            stage: Stage::Inverted,
            timings: vec![],
        };
        run.step(Stage::Packed, || Ok(())).unwrap();
        assert_eq!(run.stage, Stage::Packed);
        assert_eq!(run.timings[0].name, "pack");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "steps must run in order")]
    fn test_step_past_packed_is_a_bug() {
        let mut run = Run {
            stage: Stage::Packed,
            timings: vec![],
        };
        let _ = run.step(Stage::Packed, || Ok(()));
    }
}

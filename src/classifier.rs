//! Boundary to the digit classifier
//!
//! The model itself lives outside this crate. Anything that accepts a
//! 28x28 normalized buffer and returns a label can be plugged in.

use crate::error::PipelineError;
use crate::preprocessing::{NormalizedBuffer, Pipeline};
use crate::raster::RasterImage;
use std::sync::Arc;
use thiserror::Error;

/// Message shown to the user for any failed recognition
pub const RECOGNITION_FAILED: &str = "recognition failed";

/// Label produced by a classifier
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

#[derive(Error, Debug)]
#[error("Classifier {classifier} failed: {message}")]
pub struct ClassifierError {
    pub classifier: &'static str,
    pub message: String,
}

/// Trait that every classifier backend implements
pub trait Classifier: Send + Sync {
    /// Backend identifier, used in logs
    fn name(&self) -> &'static str;

    /// Predict a label for one normalized buffer
    fn classify(&self, input: &NormalizedBuffer) -> Result<Prediction, ClassifierError>;
}

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

impl RecognitionError {
    /// User-facing text; every failure kind reads the same
    pub fn user_message(&self) -> &'static str {
        RECOGNITION_FAILED
    }
}

/// Outcome of a full capture-to-label run
#[derive(Debug, Clone)]
pub struct Recognition {
    pub prediction: Prediction,
    pub total_time_ms: u64,
}

/// Runs the normalization pipeline and hands its output to a classifier
#[derive(Clone)]
pub struct Recognizer {
    pipeline: Pipeline,
    classifier: Arc<dyn Classifier>,
}

impl Recognizer {
    pub fn new(pipeline: Pipeline, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            pipeline,
            classifier,
        }
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    pub fn recognize(&self, image: &RasterImage) -> Result<Recognition, RecognitionError> {
        let normalized = self.pipeline.process(image)?;

        let prediction = self
            .classifier
            .classify(&normalized.buffer)
            .inspect_err(|e| tracing::warn!("{}", e))?;

        tracing::info!(
            "{} predicted {:?} (confidence {:.2})",
            self.classifier.name(),
            prediction.label,
            prediction.confidence
        );

        Ok(Recognition {
            prediction,
            total_time_ms: normalized.total_time_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::PipelineOptions;

    /// Reports which half of the buffer holds more ink
    struct HalfClassifier;

    impl Classifier for HalfClassifier {
        fn name(&self) -> &'static str {
            "half"
        }

        fn classify(&self, input: &NormalizedBuffer) -> Result<Prediction, ClassifierError> {
            let half = input.width() / 2;
            let (mut left, mut right) = (0u64, 0u64);
            for y in 0..input.height() {
                for x in 0..input.width() {
                    let v = input.get(x, y) as u64;
                    if x < half {
                        left += v;
                    } else {
                        right += v;
                    }
                }
            }
            let label = if left >= right { "left" } else { "right" };
            Ok(Prediction {
                label: label.to_string(),
                confidence: 1.0,
            })
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn classify(&self, _input: &NormalizedBuffer) -> Result<Prediction, ClassifierError> {
            Err(ClassifierError {
                classifier: self.name(),
                message: "model not loaded".to_string(),
            })
        }
    }

    fn l_shape() -> RasterImage {
        // Tall bar on the left with a short foot to the right
        let mut data = vec![255u8; 60 * 60];
        for y in 10..50 {
            for x in 10..14 {
                data[y * 60 + x] = 0;
            }
        }
        for x in 10..30 {
            for y in 46..50 {
                data[y * 60 + x] = 0;
            }
        }
        RasterImage::packed(60, 60, 1, data).unwrap()
    }

    #[test]
    fn test_recognize_passes_normalized_buffer() {
        let recognizer = Recognizer::new(
            Pipeline::new(PipelineOptions::default()),
            Arc::new(HalfClassifier),
        );
        let result = recognizer.recognize(&l_shape()).unwrap();
        assert_eq!(result.prediction.label, "left");
        assert_eq!(recognizer.classifier_name(), "half");
    }

    #[test]
    fn test_empty_canvas_never_reaches_classifier() {
        let recognizer = Recognizer::new(Pipeline::default(), Arc::new(FailingClassifier));
        let blank = RasterImage::filled_gray(30, 30, 255).unwrap();
        let err = recognizer.recognize(&blank).unwrap_err();
        assert!(matches!(
            err,
            RecognitionError::Pipeline(PipelineError::EmptyCanvas)
        ));
        assert_eq!(err.user_message(), RECOGNITION_FAILED);
    }

    #[test]
    fn test_classifier_failure_is_forwarded() {
        let recognizer = Recognizer::new(Pipeline::default(), Arc::new(FailingClassifier));
        let err = recognizer.recognize(&l_shape()).unwrap_err();
        assert!(matches!(err, RecognitionError::Classifier(_)));
        assert_eq!(err.user_message(), RECOGNITION_FAILED);
    }
}

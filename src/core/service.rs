// Classification pipeline: decode, preprocess, infer, select

use crate::core::image_utils::{self, ImageError, InputTensor};
use crate::core::labels::argmax;
use crate::core::model::{Classifier, InputShape, ModelError, PixelScale};
use std::sync::Arc;
use thiserror::Error;

/// Errors from a single classification request
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[source] ImageError),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Inference failed: {0}")]
    Inference(#[source] ModelError),
}

impl From<ImageError> for InferenceError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::EmptyImage { .. } | ImageError::InvalidTargetShape { .. } => {
                InferenceError::ShapeMismatch(e.to_string())
            }
            other => InferenceError::MalformedPayload(other),
        }
    }
}

impl From<ModelError> for InferenceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::ShapeMismatch { .. } => InferenceError::ShapeMismatch(e.to_string()),
            other => InferenceError::Inference(other),
        }
    }
}

impl InferenceError {
    /// HTTP status reported for this error
    pub fn status_code(&self) -> u16 {
        match self {
            InferenceError::MalformedPayload(_) => 400,
            InferenceError::ShapeMismatch(_) => 422,
            InferenceError::Inference(_) => 500,
        }
    }
}

/// Outcome of one classification
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: usize,
    pub scores: Vec<f32>,
}

impl Prediction {
    pub fn confidence(&self) -> f32 {
        self.scores.get(self.label).copied().unwrap_or(0.0)
    }
}

/// Process-wide classification service.
///
/// Holds the model loaded at startup; every method takes `&self` so a single
/// instance behind an `Arc` serves all invocations.
pub struct InferenceService {
    classifier: Arc<dyn Classifier>,
    scale: PixelScale,
}

impl InferenceService {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        InferenceService {
            classifier,
            scale: PixelScale::default(),
        }
    }

    pub fn with_pixel_scale(mut self, scale: PixelScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn input_shape(&self) -> InputShape {
        self.classifier.input_shape()
    }

    pub fn pixel_scale(&self) -> PixelScale {
        self.scale
    }

    /// Classify base64 image text
    pub fn classify_base64(&self, data: &str) -> Result<Prediction, InferenceError> {
        let bytes = image_utils::decode_base64_image(data)?;
        self.classify_bytes(&bytes)
    }

    /// Classify raw encoded image bytes
    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<Prediction, InferenceError> {
        let tensor = image_utils::preprocess_bytes(bytes, &self.input_shape(), self.scale)?;
        self.classify_tensor(&tensor)
    }

    /// Run the model on an already prepared tensor
    pub fn classify_tensor(&self, tensor: &InputTensor) -> Result<Prediction, InferenceError> {
        let scores = self.classifier.predict(tensor)?;
        let label = argmax(&scores).ok_or(ModelError::EmptyOutput)?;
        Ok(Prediction { label, scores })
    }

    /// Label the model assigns to an all-zero input
    pub fn classify_zeros(&self) -> Result<Prediction, InferenceError> {
        self.classify_tensor(&InputTensor::zeros(&self.input_shape()))
    }
}

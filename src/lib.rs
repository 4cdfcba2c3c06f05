// Facial Expression Classification Library
// Provides image classification for both Lambda and CLI

pub mod config;
pub mod core;
mod logging;

// Lambda-specific modules (when feature enabled)
#[cfg(feature = "aws")]
mod lambda;

pub use config::ServiceConfig;
pub use logging::init_logging;

// Re-export core functionality for external use
pub use core::{
    // Model
    Classifier, InputShape, ModelError, OnnxClassifier, PixelScale, TensorLayout,
    DEFAULT_INPUT_SIZE, DEFAULT_MODEL_PATH,
    // Image preprocessing
    decode_base64_image, decode_grayscale, preprocess_bytes,
    ImageError, InputTensor,
    // Labels
    argmax, Emotion,
    // Service
    InferenceError, InferenceService, Prediction,
    // Types
    ErrorBody, LabeledPrediction, PredictionBody, Request, Response,
};

// Re-export Lambda handler (when feature enabled)
#[cfg(feature = "aws")]
pub use lambda::{handler, process_event};

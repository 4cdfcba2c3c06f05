// Core classification functionality shared between CLI and Lambda

pub mod image_utils;
pub mod labels;
pub mod model;
pub mod service;
pub mod types;

// Re-export model types
pub use model::{
    Classifier, InputShape, ModelError, OnnxClassifier, PixelScale, TensorLayout,
    DEFAULT_INPUT_SIZE, DEFAULT_MODEL_PATH, MODEL_FILE_NAME,
};

// Re-export image utilities
pub use image_utils::{
    decode_base64_image, decode_grayscale, preprocess_bytes, to_input_tensor, to_luma, ImageError,
    InputTensor, MAX_SOURCE_DIMENSION,
};

pub use labels::{argmax, Emotion};

pub use service::{InferenceError, InferenceService, Prediction};

// Re-export common types
pub use types::{ErrorBody, LabeledPrediction, PredictionBody, Request, Response};

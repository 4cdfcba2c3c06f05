// Model loading and the classifier seam

use crate::core::image_utils::InputTensor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tract_onnx::prelude::*;

/// Default location of the packaged model artifact
pub const DEFAULT_MODEL_PATH: &str = "/opt/ml/model";

/// File looked up when the model path is a directory
pub const MODEL_FILE_NAME: &str = "model.onnx";

/// Spatial resolution the expression model was trained on
pub const DEFAULT_INPUT_SIZE: usize = 48;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to load model from {path}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    #[error("Input tensor has {actual} values, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Model produced no output values")]
    EmptyOutput,
}

/// Dimension order of the model input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// batch, height, width, channel (Keras default)
    #[default]
    Nhwc,
    /// batch, channel, height, width
    Nchw,
}

impl TensorLayout {
    pub fn from_str(s: &str) -> Option<TensorLayout> {
        match s.trim().to_lowercase().as_str() {
            "nhwc" | "channels-last" | "channels_last" => Some(TensorLayout::Nhwc),
            "nchw" | "channels-first" | "channels_first" => Some(TensorLayout::Nchw),
            _ => None,
        }
    }
}

impl fmt::Display for TensorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorLayout::Nhwc => write!(f, "nhwc"),
            TensorLayout::Nchw => write!(f, "nchw"),
        }
    }
}

/// How 8-bit intensities are mapped to model input values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelScale {
    /// 0.0 ..= 255.0
    #[default]
    Raw,
    /// 0.0 ..= 1.0
    Unit,
}

impl PixelScale {
    pub fn apply(&self, value: u8) -> f32 {
        match self {
            PixelScale::Raw => value as f32,
            PixelScale::Unit => value as f32 / 255.0,
        }
    }

    pub fn from_str(s: &str) -> Option<PixelScale> {
        match s.trim().to_lowercase().as_str() {
            "raw" | "255" => Some(PixelScale::Raw),
            "unit" | "1" | "normalized" => Some(PixelScale::Unit),
            _ => None,
        }
    }
}

impl fmt::Display for PixelScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelScale::Raw => write!(f, "raw"),
            PixelScale::Unit => write!(f, "unit"),
        }
    }
}

/// Fixed single-batch, single-channel input shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    pub height: usize,
    pub width: usize,
    pub layout: TensorLayout,
}

impl InputShape {
    pub fn new(height: usize, width: usize, layout: TensorLayout) -> Self {
        InputShape {
            height,
            width,
            layout,
        }
    }

    /// Full 4-D shape including batch and channel
    pub fn dims(&self) -> [usize; 4] {
        match self.layout {
            TensorLayout::Nhwc => [1, self.height, self.width, 1],
            TensorLayout::Nchw => [1, 1, self.height, self.width],
        }
    }

    /// Number of values in one input
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width and height as image dimensions; `None` when either is zero or
    /// does not fit in `u32`
    pub fn pixel_dims(&self) -> Option<(u32, u32)> {
        if self.is_empty() {
            return None;
        }
        Some((u32::try_from(self.width).ok()?, u32::try_from(self.height).ok()?))
    }
}

impl Default for InputShape {
    fn default() -> Self {
        InputShape::new(DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE, TensorLayout::default())
    }
}

/// A loaded image classifier.
///
/// Implementations are read-only after construction so one instance can be
/// shared across concurrent invocations.
pub trait Classifier: Send + Sync {
    /// Run forward inference, returning one score per class
    fn predict(&self, input: &InputTensor) -> Result<Vec<f32>, ModelError>;

    /// Input shape this classifier was built for
    fn input_shape(&self) -> InputShape;
}

/// Resolve the configured model path to a concrete ONNX file
pub fn resolve_model_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(MODEL_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// ONNX classifier optimized and planned once at load time
pub struct OnnxClassifier {
    plan: Arc<TypedRunnableModel<TypedModel>>,
    shape: InputShape,
    source: PathBuf,
}

impl OnnxClassifier {
    /// Load and optimize the model for a fixed input shape
    pub fn load(path: impl AsRef<Path>, shape: InputShape) -> Result<Self, ModelError> {
        let source = resolve_model_file(path.as_ref());
        let load_failed = |e: TractError| ModelError::LoadFailed {
            path: source.clone(),
            reason: format!("{:#}", e),
        };

        if shape.pixel_dims().is_none() {
            return Err(ModelError::LoadFailed {
                path: source.clone(),
                reason: format!("unusable input shape {}x{}", shape.height, shape.width),
            });
        }

        if !source.is_file() {
            return Err(ModelError::LoadFailed {
                path: source.clone(),
                reason: "file not found".to_string(),
            });
        }

        let dims = shape.dims();
        let plan: Arc<TypedRunnableModel<TypedModel>> = tract_onnx::onnx()
            .model_for_path(&source)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(dims[0], dims[1], dims[2], dims[3])),
                )
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map(Into::into)
            .map_err(load_failed)?;

        tracing::info!(path = %source.display(), ?dims, "model loaded");

        Ok(OnnxClassifier {
            plan,
            shape,
            source,
        })
    }

    /// File the model was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &InputTensor) -> Result<Vec<f32>, ModelError> {
        if input.len() != self.shape.len() || input.shape != self.shape.dims() {
            return Err(ModelError::ShapeMismatch {
                expected: self.shape.len(),
                actual: input.len(),
            });
        }

        let tensor = Tensor::from_shape(&input.shape, &input.data)
            .map_err(|e| ModelError::InferenceFailed(format!("{:#}", e)))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ModelError::InferenceFailed(format!("{:#}", e)))?;

        let first = outputs.first().ok_or(ModelError::EmptyOutput)?;
        let scores: Vec<f32> = first
            .to_array_view::<f32>()
            .map_err(|e| ModelError::InferenceFailed(format!("{:#}", e)))?
            .iter()
            .copied()
            .collect();

        if scores.is_empty() {
            return Err(ModelError::EmptyOutput);
        }
        Ok(scores)
    }

    fn input_shape(&self) -> InputShape {
        self.shape
    }
}

impl fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("source", &self.source)
            .field("shape", &self.shape)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_parsing() {
        assert_eq!(TensorLayout::from_str("NHWC"), Some(TensorLayout::Nhwc));
        assert_eq!(TensorLayout::from_str("channels_first"), Some(TensorLayout::Nchw));
        assert_eq!(TensorLayout::from_str("hwc"), None);
    }

    #[test]
    fn test_pixel_scale() {
        assert_eq!(PixelScale::Raw.apply(200), 200.0);
        assert_eq!(PixelScale::Unit.apply(0), 0.0);
        assert_eq!(PixelScale::Unit.apply(255), 1.0);
        assert_eq!(PixelScale::from_str("unit"), Some(PixelScale::Unit));
        assert_eq!(PixelScale::from_str("percent"), None);
    }

    #[test]
    fn test_input_shape_dims() {
        let shape = InputShape::default();
        assert_eq!(shape.dims(), [1, 48, 48, 1]);
        assert_eq!(shape.len(), 2304);

        let nchw = InputShape::new(32, 64, TensorLayout::Nchw);
        assert_eq!(nchw.dims(), [1, 1, 32, 64]);
    }

    #[test]
    fn test_pixel_dims_bounds() {
        assert_eq!(InputShape::new(32, 64, TensorLayout::Nhwc).pixel_dims(), Some((64, 32)));
        assert_eq!(InputShape::new(0, 48, TensorLayout::Nhwc).pixel_dims(), None);
        assert_eq!(
            InputShape::new(48, u32::MAX as usize + 1, TensorLayout::Nhwc).pixel_dims(),
            None
        );
    }

    #[test]
    fn test_load_rejects_unusable_shape() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MODEL_FILE_NAME), b"unused").unwrap();

        let result = OnnxClassifier::load(dir.path(), InputShape::new(0, 48, TensorLayout::Nhwc));
        match result {
            Err(ModelError::LoadFailed { reason, .. }) => assert!(reason.contains("input shape")),
            other => panic!("expected load failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_resolve_model_file_for_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_model_file(dir.path()), dir.path().join(MODEL_FILE_NAME));

        let file = dir.path().join("custom.onnx");
        assert_eq!(resolve_model_file(&file), file);
    }

    #[test]
    fn test_load_missing_model() {
        let result = OnnxClassifier::load("/nonexistent/fer/model.onnx", InputShape::default());
        assert!(matches!(result, Err(ModelError::LoadFailed { .. })));
    }

    #[test]
    fn test_load_garbage_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MODEL_FILE_NAME), b"definitely not protobuf").unwrap();

        let result = OnnxClassifier::load(dir.path(), InputShape::default());
        match result {
            Err(ModelError::LoadFailed { path, .. }) => {
                assert_eq!(path, dir.path().join(MODEL_FILE_NAME));
            }
            other => panic!("expected load failure, got {:?}", other.map(|_| ())),
        }
    }
}

// Runtime configuration from environment variables

use crate::core::model::{InputShape, PixelScale, TensorLayout, DEFAULT_INPUT_SIZE, DEFAULT_MODEL_PATH};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const MODEL_PATH_VAR: &str = "MODEL_PATH";
pub const INPUT_HEIGHT_VAR: &str = "MODEL_INPUT_HEIGHT";
pub const INPUT_WIDTH_VAR: &str = "MODEL_INPUT_WIDTH";
pub const INPUT_LAYOUT_VAR: &str = "MODEL_INPUT_LAYOUT";
pub const PIXEL_SCALE_VAR: &str = "MODEL_PIXEL_SCALE";

/// Everything the handler needs to load and feed the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub input_shape: InputShape,
    pub pixel_scale: PixelScale,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            input_shape: InputShape::default(),
            pixel_scale: PixelScale::default(),
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unparseable values are logged and replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_path = lookup(MODEL_PATH_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        let height = parse_dimension(INPUT_HEIGHT_VAR, lookup(INPUT_HEIGHT_VAR));
        let width = parse_dimension(INPUT_WIDTH_VAR, lookup(INPUT_WIDTH_VAR));

        let layout = lookup(INPUT_LAYOUT_VAR)
            .map(|raw| {
                TensorLayout::from_str(&raw).unwrap_or_else(|| {
                    tracing::warn!(var = INPUT_LAYOUT_VAR, value = %raw, "unknown layout, falling back to nhwc");
                    TensorLayout::default()
                })
            })
            .unwrap_or_default();

        let pixel_scale = lookup(PIXEL_SCALE_VAR)
            .map(|raw| {
                PixelScale::from_str(&raw).unwrap_or_else(|| {
                    tracing::warn!(var = PIXEL_SCALE_VAR, value = %raw, "unknown pixel scale, falling back to raw");
                    PixelScale::default()
                })
            })
            .unwrap_or_default();

        ServiceConfig {
            model_path,
            input_shape: InputShape::new(height, width, layout),
            pixel_scale,
        }
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }
}

fn parse_dimension(var: &str, raw: Option<String>) -> usize {
    let Some(raw) = raw else {
        return DEFAULT_INPUT_SIZE;
    };
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 && u32::try_from(n).is_ok() => n,
        _ => {
            tracing::warn!(var, value = %raw, "invalid input dimension, falling back to {}", DEFAULT_INPUT_SIZE);
            DEFAULT_INPUT_SIZE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServiceConfig::from_lookup(|_| None);
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.model_path, PathBuf::from("/opt/ml/model"));
        assert_eq!(config.input_shape.dims(), [1, 48, 48, 1]);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            (MODEL_PATH_VAR, "/tmp/fer.onnx"),
            (INPUT_HEIGHT_VAR, "64"),
            (INPUT_WIDTH_VAR, "32"),
            (INPUT_LAYOUT_VAR, "NCHW"),
            (PIXEL_SCALE_VAR, "unit"),
        ]));

        assert_eq!(config.model_path, PathBuf::from("/tmp/fer.onnx"));
        assert_eq!(config.input_shape.dims(), [1, 1, 64, 32]);
        assert_eq!(config.pixel_scale, PixelScale::Unit);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            (MODEL_PATH_VAR, "  "),
            (INPUT_HEIGHT_VAR, "0"),
            (INPUT_WIDTH_VAR, "wide"),
            (INPUT_LAYOUT_VAR, "hwc"),
            (PIXEL_SCALE_VAR, "percent"),
        ]));

        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_dimension_beyond_u32_falls_back() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            (INPUT_HEIGHT_VAR, "4294967296"),
            (INPUT_WIDTH_VAR, "4294967295"),
        ]));

        assert_eq!(config.input_shape.height, DEFAULT_INPUT_SIZE);
        assert_eq!(config.input_shape.width, 4294967295);
    }
}

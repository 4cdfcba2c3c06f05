// Image decoding and preprocessing for classifier input

use crate::core::model::{InputShape, PixelScale};
use base64::Engine;
use image::error::ImageError as DecodeFailure;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageReader, Limits, Luma};
use std::io::Cursor;
use thiserror::Error;

/// Largest accepted source width or height
pub const MAX_SOURCE_DIMENSION: u32 = 8192;

/// Decoder allocation ceiling for one source image
pub const MAX_DECODE_ALLOC: u64 = 128 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to decode base64 image: {0}")]
    Base64DecodeError(String),

    #[error("Invalid image format: {0}")]
    InvalidFormat(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Image exceeds decode limits: {0}")]
    TooLarge(String),

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Target shape {height}x{width} cannot be produced by resizing")]
    InvalidTargetShape { height: usize, width: usize },

    #[error("Image input is empty or invalid")]
    EmptyInput,
}

/// Model-ready pixel data: row-major `f32` values plus the 4-D shape they fill
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub data: Vec<f32>,
    pub shape: [usize; 4],
}

impl InputTensor {
    /// An all-zero tensor of the given shape
    pub fn zeros(shape: &InputShape) -> Self {
        InputTensor {
            data: vec![0.0; shape.len()],
            shape: shape.dims(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Decode base64 encoded image data
pub fn decode_base64_image(data: &str) -> Result<Vec<u8>, ImageError> {
    // Handle data URL format (e.g., "data:image/png;base64,...")
    let base64_data = match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };

    let cleaned: String = base64_data.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() {
        return Err(ImageError::EmptyInput);
    }

    base64::engine::general_purpose::STANDARD
        .decode(&cleaned)
        .map_err(|e| ImageError::Base64DecodeError(e.to_string()))
}

/// Decode image bytes and force them to single-channel luminance
pub fn decode_grayscale(bytes: &[u8]) -> Result<GrayImage, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyInput);
    }
    let format =
        image::guess_format(bytes).map_err(|e| ImageError::InvalidFormat(e.to_string()))?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SOURCE_DIMENSION);
    limits.max_image_height = Some(MAX_SOURCE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);

    let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
    reader.limits(limits);

    let image = reader.decode().map_err(|e| match e {
        limits @ DecodeFailure::Limits(_) => ImageError::TooLarge(limits.to_string()),
        other => ImageError::DecodeError(other.to_string()),
    })?;
    Ok(to_luma(image))
}

/// Luminance with ITU-R 601-2 weights, rounded the way PIL's `convert("L")` rounds.
///
/// Single-channel inputs keep their luma channel and alpha is ignored.
pub fn to_luma(image: DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray,
        luma @ (DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)) => luma.into_luma8(),
        other => {
            let rgb = other.into_rgb8();
            let (width, height) = rgb.dimensions();
            GrayImage::from_fn(width, height, |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Luma([rec601_luma(r, g, b)])
            })
        }
    }
}

fn rec601_luma(r: u8, g: u8, b: u8) -> u8 {
    // 19595 + 38470 + 7471 == 1 << 16
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Resize a grayscale image to `shape` and lay it out as a model input tensor.
///
/// Resizing is bicubic. With a single channel NHWC and NCHW share the same
/// element order, so only the reported shape differs.
pub fn to_input_tensor(
    gray: &GrayImage,
    shape: &InputShape,
    scale: PixelScale,
) -> Result<InputTensor, ImageError> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageError::EmptyImage { width, height });
    }

    let (target_w, target_h) = shape.pixel_dims().ok_or(ImageError::InvalidTargetShape {
        height: shape.height,
        width: shape.width,
    })?;

    let resized;
    let pixels = if (width, height) == (target_w, target_h) {
        gray
    } else {
        resized = image::imageops::resize(gray, target_w, target_h, FilterType::CatmullRom);
        &resized
    };

    let data = pixels
        .as_raw()
        .iter()
        .map(|&p| scale.apply(p))
        .collect();

    Ok(InputTensor {
        data,
        shape: shape.dims(),
    })
}

/// Raw image bytes to model input tensor
pub fn preprocess_bytes(
    bytes: &[u8],
    shape: &InputShape,
    scale: PixelScale,
) -> Result<InputTensor, ImageError> {
    let gray = decode_grayscale(bytes)?;
    to_input_tensor(&gray, shape, scale)
}

use crate::error::PipelineError;
use crate::raster::RasterImage;
use image::GrayImage;
use serde::Serialize;

/// Side length of the classifier input (MNIST convention)
pub const MODEL_INPUT_SIZE: u32 = 28;

/// Fixed-size single-channel buffer handed to the classifier.
///
/// Always `MODEL_INPUT_SIZE` square with `stride == width`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedBuffer {
    width: u32,
    height: u32,
    stride: usize,
    pixels: Vec<u8>,
}

impl NormalizedBuffer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.stride + x as usize]
    }

    /// View as an `image` buffer, e.g. for writing a preview PNG
    pub fn to_gray_image(&self) -> Option<GrayImage> {
        GrayImage::from_raw(self.width, self.height, self.pixels.clone())
    }
}

/// Copy a 28x28 single-channel image into a tightly strided buffer.
///
/// Rows are copied one at a time so source padding never leaks into the
/// output.
pub fn apply(image: &RasterImage) -> Result<NormalizedBuffer, PipelineError> {
    if image.width() != MODEL_INPUT_SIZE
        || image.height() != MODEL_INPUT_SIZE
        || image.channels() != 1
    {
        return Err(PipelineError::DimensionMismatch {
            expected_width: MODEL_INPUT_SIZE,
            expected_height: MODEL_INPUT_SIZE,
            width: image.width(),
            height: image.height(),
            channels: image.channels(),
        });
    }

    let stride = MODEL_INPUT_SIZE as usize;
    let mut pixels = vec![0u8; stride * MODEL_INPUT_SIZE as usize];
    for (y, dst) in pixels.chunks_exact_mut(stride).enumerate() {
        dst.copy_from_slice(image.row(y as u32));
    }

    Ok(NormalizedBuffer {
        width: MODEL_INPUT_SIZE,
        height: MODEL_INPUT_SIZE,
        stride,
        pixels,
    })
}

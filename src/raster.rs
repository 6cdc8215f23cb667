//! Raster value types shared by every preprocessing step
//!
//! A `RasterImage` is an immutable, row-major 8-bit buffer with an explicit
//! row stride. Buffers handed over by platform imaging APIs often pad each
//! row for alignment, so the stride may exceed `width * channels`.

use crate::error::PipelineError;
use image::{DynamicImage, GrayImage, RgbaImage};
use serde::Serialize;

/// Immutable 8-bit raster with 1 (gray) or 4 (RGBA) channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    channels: u8,
    stride: usize,
    data: Vec<u8>,
}

impl RasterImage {
    /// Build a raster from raw samples, validating the layout
    pub fn new(
        width: u32,
        height: u32,
        channels: u8,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidImage(format!(
                "zero-sized image {}x{}",
                width, height
            )));
        }
        if channels != 1 && channels != 4 {
            return Err(PipelineError::InvalidImage(format!(
                "unsupported channel count {}",
                channels
            )));
        }

        let row_bytes = width as usize * channels as usize;
        if stride < row_bytes {
            return Err(PipelineError::InvalidImage(format!(
                "stride {} is smaller than row size {}",
                stride, row_bytes
            )));
        }

        // The last row does not need trailing padding
        let required = stride
            .checked_mul(height as usize - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or_else(|| {
                PipelineError::InvalidImage(format!(
                    "stride {} overflows a {}-row layout",
                    stride, height
                ))
            })?;
        if data.len() < required {
            return Err(PipelineError::InvalidImage(format!(
                "buffer holds {} bytes, layout needs {}",
                data.len(),
                required
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            stride,
            data,
        })
    }

    /// Build a tightly packed raster (stride == width * channels)
    pub fn packed(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self, PipelineError> {
        let stride = width as usize * channels as usize;
        Self::new(width, height, channels, stride, data)
    }

    /// Uniform single-channel raster, mostly useful for blank canvases
    pub fn filled_gray(width: u32, height: u32, value: u8) -> Result<Self, PipelineError> {
        Self::packed(width, height, 1, vec![value; width as usize * height as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes of meaningful samples in one row
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Meaningful samples of row `y`, without padding
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    /// Samples of the pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels as usize;
        let start = y as usize * self.stride + x as usize * c;
        &self.data[start..start + c]
    }

    /// Raw backing buffer, including any row padding
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Copy rows into a fresh buffer with no padding
    pub fn to_packed_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.row_bytes() * self.height as usize);
        for y in 0..self.height {
            out.extend_from_slice(self.row(y));
        }
        out
    }

    /// Convert a decoded image. `Luma8` stays single-channel; everything
    /// else is expanded to RGBA.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self, PipelineError> {
        match image {
            DynamicImage::ImageLuma8(gray) => Self::from_gray(gray),
            other => Self::from_rgba(&other.to_rgba8()),
        }
    }

    pub fn from_gray(image: &GrayImage) -> Result<Self, PipelineError> {
        Self::packed(image.width(), image.height(), 1, image.as_raw().clone())
    }

    pub fn from_rgba(image: &RgbaImage) -> Result<Self, PipelineError> {
        Self::packed(image.width(), image.height(), 4, image.as_raw().clone())
    }

    /// Tightly packed `image` buffer of the same content
    pub fn to_dynamic(&self) -> Result<DynamicImage, PipelineError> {
        let raw = self.to_packed_vec();
        let image = match self.channels {
            1 => GrayImage::from_raw(self.width, self.height, raw).map(DynamicImage::ImageLuma8),
            _ => RgbaImage::from_raw(self.width, self.height, raw).map(DynamicImage::ImageRgba8),
        };
        image.ok_or_else(|| PipelineError::InvalidImage("buffer size mismatch".to_string()))
    }
}

/// Smallest rectangle enclosing every foreground pixel.
///
/// Both edges are inclusive: a single foreground pixel at (x, y) gives
/// `min_x == max_x == x` and `min_y == max_y == y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

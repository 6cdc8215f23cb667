use crate::error::PipelineError;
use crate::raster::RasterImage;
use image::{imageops, imageops::FilterType, DynamicImage};
use serde::Serialize;

/// Interpolation used when scaling the cropped ink.
///
/// Nearest-neighbour is not offered: it loses the anti-aliased stroke edges
/// the classifier relies on at 28x28.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    /// Bicubic (Catmull-Rom spline)
    #[default]
    CatmullRom,
    Lanczos3,
    Gaussian,
    /// Bilinear
    Triangle,
}

impl ResampleFilter {
    pub const ALL: [ResampleFilter; 4] = [
        Self::CatmullRom,
        Self::Lanczos3,
        Self::Gaussian,
        Self::Triangle,
    ];

    /// Parse from a config value or request field
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "catmull-rom" | "catmullrom" | "bicubic" | "cubic" => Some(Self::CatmullRom),
            "lanczos3" | "lanczos" => Some(Self::Lanczos3),
            "gaussian" => Some(Self::Gaussian),
            "triangle" | "bilinear" => Some(Self::Triangle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CatmullRom => "catmull-rom",
            Self::Lanczos3 => "lanczos3",
            Self::Gaussian => "gaussian",
            Self::Triangle => "triangle",
        }
    }

    fn filter_type(self) -> FilterType {
        match self {
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
            Self::Gaussian => FilterType::Gaussian,
            Self::Triangle => FilterType::Triangle,
        }
    }
}

/// Stretch an image to exactly `target_width` x `target_height`.
///
/// Aspect ratio is not preserved; the cropped ink fills the whole target.
pub fn apply(
    image: &RasterImage,
    target_width: u32,
    target_height: u32,
    filter: ResampleFilter,
) -> Result<RasterImage, PipelineError> {
    if target_width == 0 || target_height == 0 {
        return Err(PipelineError::InvalidDimensions {
            width: target_width,
            height: target_height,
        });
    }

    let resized = match image.to_dynamic()? {
        DynamicImage::ImageLuma8(gray) => {
            let out = imageops::resize(&gray, target_width, target_height, filter.filter_type());
            RasterImage::from_gray(&out)?
        }
        other => {
            let out = imageops::resize(
                &other.to_rgba8(),
                target_width,
                target_height,
                filter.filter_type(),
            );
            RasterImage::from_rgba(&out)?
        }
    };

    tracing::trace!(
        "resized {}x{} -> {}x{} with {}",
        image.width(),
        image.height(),
        target_width,
        target_height,
        filter.as_str()
    );

    Ok(resized)
}

use crate::error::PipelineError;
use crate::raster::RasterImage;
use std::sync::OnceLock;

/// Rec. 709 luma weights, as used by a saturation-zeroing colour filter
const LUMA_R: f32 = 0.2125;
const LUMA_G: f32 = 0.7154;
const LUMA_B: f32 = 0.0721;

// sRGB transfer function constants
const SRGB_THRESHOLD: f32 = 0.04045;
const LINEAR_THRESHOLD: f32 = 0.0031308;
const SRGB_A: f32 = 1.055;
const SRGB_B: f32 = 0.055;
const LINEAR_SCALE: f32 = 12.92;
const GAMMA: f32 = 2.4;

/// Collapse an image to a single luminance channel.
///
/// Colour saturation is driven to zero while luminance is kept, which is
/// not the same as averaging the channels. Weights apply in linear light and
/// the result is re-encoded as sRGB, so neutral grays map to themselves.
/// RGBA input is composited over a white canvas first so transparent
/// regions read as background.
pub fn apply(image: &RasterImage) -> Result<RasterImage, PipelineError> {
    let (width, height) = (image.width(), image.height());
    let mut out = Vec::with_capacity(width as usize * height as usize);

    match image.channels() {
        1 => {
            for y in 0..height {
                out.extend_from_slice(image.row(y));
            }
        }
        4 => {
            for y in 0..height {
                out.extend(image.row(y).chunks_exact(4).map(luminance));
            }
        }
        n => {
            return Err(PipelineError::InvalidImage(format!(
                "unsupported channel count {}",
                n
            )))
        }
    }

    RasterImage::packed(width, height, 1, out)
}

/// sRGB byte to linear light in [0, 1]
fn srgb_to_linear_lut() -> &'static [f32; 256] {
    static LUT: OnceLock<[f32; 256]> = OnceLock::new();
    LUT.get_or_init(|| {
        let mut lut = [0.0f32; 256];
        for (i, v) in lut.iter_mut().enumerate() {
            let c = i as f32 / 255.0;
            *v = if c <= SRGB_THRESHOLD {
                c / LINEAR_SCALE
            } else {
                ((c + SRGB_B) / SRGB_A).powf(GAMMA)
            };
        }
        lut
    })
}

fn linear_to_srgb(l: f32) -> u8 {
    let l = l.clamp(0.0, 1.0);
    let c = if l <= LINEAR_THRESHOLD {
        l * LINEAR_SCALE
    } else {
        SRGB_A * l.powf(1.0 / GAMMA) - SRGB_B
    };
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

fn luminance(rgba: &[u8]) -> u8 {
    let lut = srgb_to_linear_lut();
    let alpha = rgba[3] as f32 / 255.0;
    let over_white = |c: u8| lut[c as usize] * alpha + (1.0 - alpha);

    let luma = LUMA_R * over_white(rgba[0])
        + LUMA_G * over_white(rgba[1])
        + LUMA_B * over_white(rgba[2]);
    linear_to_srgb(luma)
}

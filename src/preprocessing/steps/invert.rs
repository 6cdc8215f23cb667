use crate::error::PipelineError;
use crate::raster::RasterImage;

/// Flip polarity so dark ink on a light canvas becomes light ink on dark.
///
/// Every colour sample maps to `255 - v`; alpha is left alone on RGBA input.
pub fn apply(image: &RasterImage) -> Result<RasterImage, PipelineError> {
    let channels = image.channels() as usize;
    let mut out = Vec::with_capacity(image.row_bytes() * image.height() as usize);

    for y in 0..image.height() {
        if channels == 1 {
            out.extend(image.row(y).iter().map(|&v| 255 - v));
        } else {
            for px in image.row(y).chunks_exact(channels) {
                out.extend([255 - px[0], 255 - px[1], 255 - px[2], px[3]]);
            }
        }
    }

    RasterImage::packed(image.width(), image.height(), image.channels(), out)
}

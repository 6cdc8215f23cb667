use crate::error::PipelineError;
use crate::raster::{BoundingBox, RasterImage};

/// Intensity of untouched canvas; anything strictly darker is ink
pub const BACKGROUND: u8 = 255;

/// Find the smallest box enclosing every pixel darker than pure white.
///
/// Scans the whole image. Ink strokes are sparse and irregular, so there is
/// no early exit or projection shortcut.
pub fn bounding_box(image: &RasterImage) -> Result<BoundingBox, PipelineError> {
    if image.channels() != 1 {
        return Err(PipelineError::InvalidImage(format!(
            "bounding box needs a single-channel image, got {} channels",
            image.channels()
        )));
    }

    let mut bbox: Option<BoundingBox> = None;

    for y in 0..image.height() {
        for (x, &value) in image.row(y).iter().enumerate() {
            if value >= BACKGROUND {
                continue;
            }
            let x = x as u32;
            bbox = Some(match bbox {
                None => BoundingBox {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(b) => BoundingBox {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            });
        }
    }

    bbox.ok_or(PipelineError::EmptyCanvas)
}

/// Copy the region covered by `bbox` into a new tightly packed image
pub fn crop(image: &RasterImage, bbox: BoundingBox) -> Result<RasterImage, PipelineError> {
    if bbox.min_x > bbox.max_x || bbox.min_y > bbox.max_y {
        return Err(PipelineError::InvalidImage(format!(
            "inverted crop box {:?}",
            bbox
        )));
    }
    if bbox.max_x >= image.width() || bbox.max_y >= image.height() {
        return Err(PipelineError::InvalidImage(format!(
            "crop box {:?} exceeds {}x{} image",
            bbox,
            image.width(),
            image.height()
        )));
    }

    let channels = image.channels() as usize;
    let start = bbox.min_x as usize * channels;
    let end = (bbox.max_x as usize + 1) * channels;

    let mut out = Vec::with_capacity((end - start) * bbox.height() as usize);
    for y in bbox.min_y..=bbox.max_y {
        out.extend_from_slice(&image.row(y)[start..end]);
    }

    RasterImage::packed(bbox.width(), bbox.height(), image.channels(), out)
}

/// Bounding box followed by crop, returning both
pub fn apply(image: &RasterImage) -> Result<(RasterImage, BoundingBox), PipelineError> {
    let bbox = bounding_box(image)?;
    let cropped = crop(image, bbox)?;
    Ok((cropped, bbox))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(width: u32, height: u32, ink: &[(u32, u32)]) -> RasterImage {
        let mut data = vec![BACKGROUND; (width * height) as usize];
        for &(x, y) in ink {
            data[(y * width + x) as usize] = 0;
        }
        RasterImage::packed(width, height, 1, data).unwrap()
    }

    #[test]
    fn test_single_pixel_box_is_inclusive() {
        let img = canvas(100, 100, &[(50, 50)]);
        let bbox = bounding_box(&img).unwrap();
        assert_eq!(
            bbox,
            BoundingBox {
                min_x: 50,
                min_y: 50,
                max_x: 50,
                max_y: 50
            }
        );

        let cropped = crop(&img, bbox).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (1, 1));
        assert_eq!(cropped.pixel(0, 0), &[0]);
    }

    #[test]
    fn test_blank_canvas_is_empty() {
        let img = canvas(50, 50, &[]);
        assert_eq!(bounding_box(&img), Err(PipelineError::EmptyCanvas));
    }

    #[test]
    fn test_near_white_counts_as_foreground() {
        let mut data = vec![BACKGROUND; 16];
        data[6] = 254;
        let img = RasterImage::packed(4, 4, 1, data).unwrap();
        let bbox = bounding_box(&img).unwrap();
        assert_eq!((bbox.min_x, bbox.min_y), (2, 1));
    }

    #[test]
    fn test_box_covers_scattered_ink() {
        let ink = [(3, 17), (40, 2), (12, 30), (25, 25)];
        let img = canvas(64, 48, &ink);
        let bbox = bounding_box(&img).unwrap();
        assert_eq!(
            bbox,
            BoundingBox {
                min_x: 3,
                min_y: 2,
                max_x: 40,
                max_y: 30
            }
        );
        for (x, y) in ink {
            assert!(bbox.contains(x, y));
        }
    }

    #[test]
    fn test_crop_honors_source_stride() {
        // 4x3 image stored with 4 bytes of padding per row
        let mut data = vec![0xAA; 8 * 3];
        for y in 0..3 {
            for x in 0..4 {
                data[y * 8 + x] = (y * 4 + x) as u8;
            }
        }
        let img = RasterImage::new(4, 3, 1, 8, data).unwrap();
        let bbox = BoundingBox {
            min_x: 1,
            min_y: 1,
            max_x: 2,
            max_y: 2,
        };
        let cropped = crop(&img, bbox).unwrap();
        assert_eq!(cropped.to_packed_vec(), vec![5, 6, 9, 10]);
    }

    #[test]
    fn test_crop_rejects_box_outside_image() {
        let img = canvas(10, 10, &[(1, 1)]);
        let bbox = BoundingBox {
            min_x: 5,
            min_y: 5,
            max_x: 10,
            max_y: 9,
        };
        assert!(matches!(crop(&img, bbox), Err(PipelineError::InvalidImage(_))));
    }

    #[test]
    fn test_bounding_box_needs_grayscale() {
        let img = RasterImage::packed(2, 2, 4, vec![0; 16]).unwrap();
        assert!(matches!(
            bounding_box(&img),
            Err(PipelineError::InvalidImage(_))
        ));
    }
}

//! Box outline overlay.
//!
//! Outlines are unfilled rectangles with a fixed color and stroke width. The
//! stroke grows inward from the box edge so an outline never spills outside
//! the box it marks.

use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::decode::DecodedImage;
use crate::label::NormalizedRect;

/// Stroke used for every box outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// RGB stroke color.
    pub color: [u8; 3],
    /// Stroke width in pixels.
    pub stroke_width: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0],
            stroke_width: 3,
        }
    }
}

/// Draw every region onto a copy of `image` in one pass.
///
/// Regions are normalized against `image`'s own dimensions, so callers must
/// pass the already rotated image. Regions that round to zero pixels are
/// skipped.
pub fn draw_regions(
    image: &DecodedImage,
    regions: &[NormalizedRect],
    style: &OverlayStyle,
) -> DecodedImage {
    if regions.is_empty() {
        return image.clone();
    }
    let Some(mut canvas) = image.to_rgb_image() else {
        return image.clone();
    };

    let color = image::Rgb(style.color);
    for region in regions {
        let Some((left, top, width, height)) = region
            .to_pixels(image.width, image.height)
            .snap(image.width, image.height)
        else {
            continue;
        };

        for inset in 0..style.stroke_width.max(1) {
            let (Some(w), Some(h)) = (
                width.checked_sub(2 * inset).filter(|w| *w > 0),
                height.checked_sub(2 * inset).filter(|h| *h > 0),
            ) else {
                break;
            };
            let rect = Rect::at((left + inset) as i32, (top + inset) as i32).of_size(w, h);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    DecodedImage::from_rgb_image(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 3] = [255, 0, 0];

    fn blank(width: u32, height: u32) -> DecodedImage {
        DecodedImage::new(width, height, vec![0u8; (width * height * 3) as usize])
    }

    fn pixel(img: &DecodedImage, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y * img.width + x) * 3) as usize;
        [img.pixels[idx], img.pixels[idx + 1], img.pixels[idx + 2]]
    }

    #[test]
    fn no_regions_returns_input() {
        let img = blank(10, 10);
        assert_eq!(draw_regions(&img, &[], &OverlayStyle::default()), img);
    }

    #[test]
    fn outline_is_unfilled() {
        let img = blank(100, 50);
        let region = NormalizedRect::new(0.1, 0.2, 0.5, 0.6);
        let out = draw_regions(&img, &[region], &OverlayStyle::default());

        // Box spans x 10..60, y 10..40.
        assert_eq!(pixel(&out, 10, 10), RED);
        assert_eq!(pixel(&out, 59, 39), RED);
        assert_eq!(pixel(&out, 12, 25), RED);
        assert_eq!(pixel(&out, 35, 25), [0, 0, 0]);
        assert_eq!(pixel(&out, 5, 5), [0, 0, 0]);
    }

    #[test]
    fn stroke_width_grows_inward() {
        let img = blank(40, 40);
        let style = OverlayStyle {
            color: [0, 255, 0],
            stroke_width: 2,
        };
        let out = draw_regions(&img, &[NormalizedRect::new(0.25, 0.25, 0.5, 0.5)], &style);

        assert_eq!(pixel(&out, 10, 20), [0, 255, 0]);
        assert_eq!(pixel(&out, 11, 20), [0, 255, 0]);
        assert_eq!(pixel(&out, 12, 20), [0, 0, 0]);
        assert_eq!(pixel(&out, 9, 20), [0, 0, 0]);
    }

    #[test]
    fn degenerate_region_is_skipped() {
        let img = blank(20, 20);
        let out = draw_regions(
            &img,
            &[NormalizedRect::new(0.5, 0.5, 0.0, 0.0)],
            &OverlayStyle::default(),
        );
        assert_eq!(out, img);
    }

    #[test]
    fn full_frame_region_stays_in_bounds() {
        let img = blank(8, 6);
        let out = draw_regions(
            &img,
            &[NormalizedRect::new(0.0, 0.0, 1.0, 1.0)],
            &OverlayStyle::default(),
        );
        assert_eq!(pixel(&out, 0, 0), RED);
        assert_eq!(pixel(&out, 7, 5), RED);
    }
}

//! Boxlabel Core - image pipeline and label model
//!
//! This crate provides the synchronous core of Boxlabel: source decoding,
//! size-budget compression for the preprocessed tier, quarter-turn rotation
//! and box overlay for the processed tier, and the label data model.
//!
//! Nothing here touches the filesystem; `boxlabel-service` owns the on-disk
//! tiers and calls into this crate from blocking tasks.

pub mod decode;
pub mod encode;
pub mod label;
pub mod transform;

pub use decode::{DecodeError, DecodedImage, SourceMeta};
pub use encode::{compress, CompressError, CompressPolicy, Compressed};
pub use label::{BoxRecord, FieldSet, FieldValue, FieldValues, ImageLabel, NormalizedRect, RegionBox};
pub use transform::{apply_rotation, draw_regions, OverlayStyle, Rotation};

/// Render the processed image: rotate first, then outline `regions`.
///
/// Regions are normalized against the rotated dimensions.
pub fn render_display(
    preprocessed: &DecodedImage,
    rotation: Rotation,
    regions: &[NormalizedRect],
    style: &OverlayStyle,
) -> DecodedImage {
    let rotated = apply_rotation(preprocessed, rotation);
    draw_regions(&rotated, regions, style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_display_places_boxes_in_rotated_frame() {
        // 40x20 landscape becomes 20x40 portrait after a quarter turn.
        let img = DecodedImage::new(40, 20, vec![0u8; 40 * 20 * 3]);
        let style = OverlayStyle::default();
        let out = render_display(
            &img,
            Rotation::Cw90,
            &[NormalizedRect::new(0.0, 0.5, 1.0, 0.5)],
            &style,
        );

        assert_eq!((out.width, out.height), (20, 40));
        let idx = ((20 * out.width) * 3) as usize;
        assert_eq!(&out.pixels[idx..idx + 3], &style.color);
    }

    #[test]
    fn render_display_is_deterministic() {
        let pixels: Vec<u8> = (0..30 * 10 * 3).map(|i| (i % 256) as u8).collect();
        let img = DecodedImage::new(30, 10, pixels);
        let regions = [NormalizedRect::new(0.1, 0.1, 0.5, 0.5)];
        let style = OverlayStyle::default();

        assert_eq!(
            render_display(&img, Rotation::Cw180, &regions, &style),
            render_display(&img, Rotation::Cw180, &regions, &style)
        );
    }
}

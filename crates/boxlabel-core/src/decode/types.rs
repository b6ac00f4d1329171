//! Types shared by metadata reads, decoding and resizing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from reading or decoding a source image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Content sniffing found no known image signature.
    #[error("unrecognized image format")]
    InvalidFormat,

    /// The signature matched but the header or pixel data did not parse.
    /// Carries the decoder's message.
    #[error("unreadable image data: {0}")]
    CorruptedFile(String),

    /// Decoding succeeded with a zero width or height.
    #[error("image has no pixels")]
    EmptyImage,
}

/// Downscale filter, named independently of the `image` crate so it can
/// live in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Nearest,
    Bilinear,
    #[default]
    Lanczos3,
}

impl FilterType {
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType as Image;
        match self {
            FilterType::Nearest => Image::Nearest,
            FilterType::Bilinear => Image::Triangle,
            FilterType::Lanczos3 => Image::Lanczos3,
        }
    }
}

/// Transform that makes a stored image upright.
///
/// Every EXIF orientation tag is some number of clockwise quarter turns,
/// optionally followed by a horizontal mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub cw_turns: u8,
    pub mirror: bool,
}

impl Orientation {
    pub const UPRIGHT: Self = Self {
        cw_turns: 0,
        mirror: false,
    };

    /// Decode an EXIF orientation tag (1-8). Unknown values are upright.
    pub fn from_exif(tag: u32) -> Self {
        let (cw_turns, mirror) = match tag {
            2 => (0, true),
            3 => (2, false),
            4 => (2, true),
            5 => (1, true),
            6 => (1, false),
            7 => (3, true),
            8 => (3, false),
            _ => (0, false),
        };
        Self { cw_turns, mirror }
    }

    /// No turn and no mirror; applying it is a no-op.
    pub fn is_upright(self) -> bool {
        self.cw_turns % 4 == 0 && !self.mirror
    }

    pub fn swaps_dimensions(self) -> bool {
        self.cw_turns % 2 == 1
    }
}

/// What the compressor needs to know about a source before decoding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceMeta {
    /// Stored width, before orientation is applied.
    pub width: u32,
    /// Stored height, before orientation is applied.
    pub height: u32,
    /// Size of the encoded source file.
    pub byte_len: usize,
    pub orientation: Orientation,
}

impl SourceMeta {
    /// Longer side. Orientation only swaps the sides, so this holds for the
    /// upright image too.
    pub fn long_edge(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Row-major RGB8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 3);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    /// Copy into an `RgbImage`; `None` if the buffer length is inconsistent.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_maps_to_triangle() {
        assert_eq!(
            FilterType::Bilinear.to_image_filter(),
            image::imageops::FilterType::Triangle
        );
        assert_eq!(FilterType::default(), FilterType::Lanczos3);
    }

    #[test]
    fn exif_tags_decode_to_turns_and_mirror() {
        assert!(Orientation::from_exif(1).is_upright());
        assert!(Orientation::from_exif(42).is_upright());
        assert_eq!(
            Orientation::from_exif(6),
            Orientation {
                cw_turns: 1,
                mirror: false
            }
        );
        assert!(Orientation::from_exif(2).mirror);
        assert!(!Orientation::from_exif(2).swaps_dimensions());

        let swapping: Vec<u32> = (1..=8)
            .filter(|&tag| Orientation::from_exif(tag).swaps_dimensions())
            .collect();
        assert_eq!(swapping, vec![5, 6, 7, 8]);
    }

    #[test]
    fn long_edge_ignores_orientation() {
        let mut meta = SourceMeta {
            width: 2000,
            height: 3000,
            byte_len: 1024,
            ..Default::default()
        };
        assert_eq!(meta.long_edge(), 3000);

        meta.orientation = Orientation::from_exif(8);
        assert_eq!(meta.long_edge(), 3000);
    }

    #[test]
    fn rgb_image_conversion_keeps_pixels() {
        let img = DecodedImage::new(4, 2, vec![7u8; 4 * 2 * 3]);
        let rgb = img.to_rgb_image().unwrap();
        assert_eq!(rgb.dimensions(), (4, 2));
        assert_eq!(DecodedImage::from_rgb_image(rgb), img);
    }

    #[test]
    fn inconsistent_buffer_has_no_rgb_image() {
        let img = DecodedImage {
            width: 4,
            height: 4,
            pixels: vec![0; 5],
        };
        assert!(img.to_rgb_image().is_none());
    }
}

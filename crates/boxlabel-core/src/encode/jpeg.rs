//! JPEG encoding for the derived image tiers.
//!
//! Every derived file is a baseline RGB JPEG produced by the `image` crate's
//! encoder; only the quality setting varies. The size-budget loop calls it
//! repeatedly at falling qualities, and the renderer calls it once per
//! processed image.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use std::io::Cursor;
use thiserror::Error;

use crate::decode::DecodedImage;

/// Errors that can occur during JPEG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Buffer length is not `width * height * 3`.
    #[error("pixel buffer holds {actual} bytes, {expected} expected for RGB8")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("cannot encode a {width}x{height} image")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder itself failed; carries its message.
    #[error("jpeg encoder failed: {0}")]
    EncodingFailed(String),
}

/// Encode RGB pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality, clamped to 1-100
///
/// # Quality Guidelines
///
/// * 95: pass-through re-encode of sources already within budget
/// * 90: first attempt of the size-budget loop
/// * 50: floor of that loop; below it artifacts hide box edges
///
/// Output carries no EXIF block, so a decoder reads it upright as stored.
///
/// # Example
///
/// ```
/// use boxlabel_core::encode::encode_jpeg;
///
/// let pixels = vec![128u8; 64 * 48 * 3];
/// let jpeg = encode_jpeg(&pixels, 64, 48, 90).unwrap();
///
/// assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
/// ```
///
/// # Errors
///
/// Returns an error for zero dimensions, a pixel buffer whose length is not
/// `width * height * 3`, or an encoder failure.
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let quality = quality.clamp(1, 100);
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);

    encoder
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Encode a decoded image at the given quality.
pub fn encode_image(image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    encode_jpeg(&image.pixels, image.width, image.height, quality)
}

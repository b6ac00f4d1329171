//! Source image metadata reads and decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::DynamicImage;
use image::ImageReader;

use super::{DecodeError, DecodedImage, Orientation, SourceMeta};

/// Read dimensions and orientation without decoding pixel data.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be guessed from
/// the bytes, `DecodeError::CorruptedFile` if the header is unreadable.
pub fn read_meta(bytes: &[u8]) -> Result<SourceMeta, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    Ok(SourceMeta {
        width,
        height,
        byte_len: bytes.len(),
        orientation: extract_orientation(bytes),
    })
}

/// Decode any allow-listed source format, applying EXIF orientation.
///
/// The result is upright RGB; alpha is dropped. For animated GIFs the first
/// frame is used.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` for unrecognized bytes and
/// `DecodeError::CorruptedFile` when decoding fails.
pub fn decode_source(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let orientation = extract_orientation(bytes);
    let img = decode_dynamic(bytes)?;
    let rgb_img = apply_orientation(img, orientation).into_rgb8();
    if rgb_img.width() == 0 || rgb_img.height() == 0 {
        return Err(DecodeError::EmptyImage);
    }
    Ok(DecodedImage::from_rgb_image(rgb_img))
}

/// Decode without touching orientation.
///
/// Derived tiers are already upright and carry no EXIF block, so the
/// renderer uses this path.
pub fn decode_upright(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let rgb_img = decode_dynamic(bytes)?.into_rgb8();
    if rgb_img.width() == 0 || rgb_img.height() == 0 {
        return Err(DecodeError::EmptyImage);
    }
    Ok(DecodedImage::from_rgb_image(rgb_img))
}

fn decode_dynamic(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))
}

/// Extract EXIF orientation from any container kamadak-exif understands.
///
/// Sources without EXIF are upright.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from_exif)
            .unwrap_or_default(),
        Err(_) => Orientation::UPRIGHT,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    if orientation.is_upright() {
        return img;
    }
    let turned = match orientation.cw_turns % 4 {
        1 => img.rotate90(),
        2 => img.rotate180(),
        3 => img.rotate270(),
        _ => img,
    };
    if orientation.mirror {
        turned.fliph()
    } else {
        turned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_jpeg;

    fn jpeg_fixture(width: u32, height: u32) -> Vec<u8> {
        let pixels = vec![90u8; (width * height * 3) as usize];
        encode_jpeg(&pixels, width, height, 90).unwrap()
    }

    /// Insert an APP1 Exif segment holding only an Orientation tag right
    /// after the SOI marker.
    fn with_exif_orientation(jpeg: &[u8], tag: u16) -> Vec<u8> {
        let mut tiff = b"MM\0\x2A\0\0\0\x08".to_vec();
        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&0x0112u16.to_be_bytes());
        tiff.extend_from_slice(&3u16.to_be_bytes());
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&tag.to_be_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_be_bytes());

        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&tiff);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn read_meta_reports_dimensions_and_size() {
        let bytes = jpeg_fixture(64, 32);
        let meta = read_meta(&bytes).unwrap();
        assert_eq!((meta.width, meta.height), (64, 32));
        assert_eq!(meta.byte_len, bytes.len());
        assert_eq!(meta.orientation, Orientation::UPRIGHT);
    }

    #[test]
    fn read_meta_rejects_garbage() {
        assert!(matches!(
            read_meta(b"definitely not an image"),
            Err(DecodeError::InvalidFormat)
        ));
    }

    #[test]
    fn decode_source_handles_png_with_alpha() {
        let img = decode_source(&png_fixture(8, 6)).unwrap();
        assert_eq!((img.width, img.height), (8, 6));
        assert_eq!(img.pixels.len(), 8 * 6 * 3);
        assert_eq!(&img.pixels[0..3], &[10, 20, 30]);
    }

    #[test]
    fn decode_truncated_jpeg_fails() {
        let bytes = jpeg_fixture(32, 32);
        let truncated = &bytes[..bytes.len() / 3];
        assert!(decode_source(truncated).is_err());
    }

    #[test]
    fn decode_upright_matches_source_without_exif() {
        let bytes = jpeg_fixture(16, 8);
        assert_eq!(decode_upright(&bytes).unwrap(), decode_source(&bytes).unwrap());
    }

    #[test]
    fn exif_orientation_six_is_read_and_applied() {
        let bytes = with_exif_orientation(&jpeg_fixture(40, 20), 6);

        let meta = read_meta(&bytes).unwrap();
        assert_eq!(meta.orientation, Orientation::from_exif(6));
        assert_eq!((meta.width, meta.height), (40, 20));

        let upright = decode_source(&bytes).unwrap();
        assert_eq!((upright.width, upright.height), (20, 40));

        let stored = decode_upright(&bytes).unwrap();
        assert_eq!((stored.width, stored.height), (40, 20));
    }

    #[test]
    fn exif_without_rotation_keeps_dimensions() {
        let bytes = with_exif_orientation(&jpeg_fixture(40, 20), 1);
        assert_eq!(read_meta(&bytes).unwrap().orientation, Orientation::UPRIGHT);

        let img = decode_source(&bytes).unwrap();
        assert_eq!((img.width, img.height), (40, 20));
    }

    #[test]
    fn orientation_transform_swaps_dimensions() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(4, 2));
        let rotated = apply_orientation(img, Orientation::from_exif(6));
        assert_eq!((rotated.width(), rotated.height()), (2, 4));
    }
}

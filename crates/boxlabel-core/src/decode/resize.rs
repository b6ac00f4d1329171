//! Fit-inside resizing for the preprocessed tier.
//!
//! Resizing never enlarges: an image that already fits is returned as-is.

use super::{DecodeError, DecodedImage, FilterType};

/// Resample to exactly `width x height`.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage);
    }

    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let source = image
        .to_rgb_image()
        .ok_or_else(|| DecodeError::CorruptedFile("pixel buffer size mismatch".to_string()))?;
    Ok(DecodedImage::from_rgb_image(image::imageops::resize(
        &source,
        width,
        height,
        filter.to_image_filter(),
    )))
}

/// Scale down, keeping the aspect ratio, until both edges are at most
/// `max_edge`. Images that already fit come back unchanged.
pub fn resize_to_fit(
    image: &DecodedImage,
    max_edge: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::EmptyImage);
    }

    let (new_width, new_height) = fit_inside(image.width, image.height, max_edge);
    resize(image, new_width, new_height, filter)
}

/// Dimensions of `width x height` fitted inside a `max_edge` square.
///
/// Never returns dimensions larger than the input.
pub fn fit_inside(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    if width <= max_edge && height <= max_edge {
        return (width, height);
    }

    // Scale the long edge to the bound and round the short one.
    let scale_short = |long: u32, short: u32| {
        let scaled = (short as f64 * max_edge as f64 / long as f64).round() as u32;
        scaled.clamp(1, short)
    };
    if width >= height {
        (max_edge, scale_short(width, height))
    } else {
        (scale_short(height, width), max_edge)
    }
}

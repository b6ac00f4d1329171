//! Quarter-turn rotation of display images.
//!
//! Rotations are clockwise and lossless: pixels are moved, never
//! interpolated, so rendering the same rotation twice gives identical
//! pixels.

use serde::{Deserialize, Serialize};

use crate::decode::DecodedImage;

/// Clockwise display rotation, restricted to quarter turns.
///
/// Serialized as the number of degrees (`0`, `90`, `180`, `270`). Values that
/// are not a multiple of 90 read as [`Rotation::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "u16")]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Map degrees onto a quarter turn; anything else is no rotation.
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Cw90,
            180 => Rotation::Cw180,
            270 => Rotation::Cw270,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }

    /// `(self + delta) mod 360`.
    ///
    /// A delta that is not a quarter turn leaves the rotation unchanged.
    pub fn rotate_by(self, delta_degrees: i64) -> Self {
        if delta_degrees.rem_euclid(90) != 0 {
            return self;
        }
        Self::from_degrees(i64::from(self.degrees()) + delta_degrees)
    }

    /// Returns true if this rotation swaps width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Cw90 | Rotation::Cw270)
    }

    /// Dimensions of a `width x height` image after this rotation.
    pub fn rotated_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

impl From<i64> for Rotation {
    fn from(degrees: i64) -> Self {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// Apply a quarter-turn rotation to an image.
///
/// `Rotation::None` returns a clone.
pub fn apply_rotation(image: &DecodedImage, rotation: Rotation) -> DecodedImage {
    if rotation == Rotation::None {
        return image.clone();
    }

    let Some(rgb) = image.to_rgb_image() else {
        return image.clone();
    };

    let rotated = match rotation {
        Rotation::None => rgb,
        Rotation::Cw90 => image::imageops::rotate90(&rgb),
        Rotation::Cw180 => image::imageops::rotate180(&rgb),
        Rotation::Cw270 => image::imageops::rotate270(&rgb),
    };

    DecodedImage::from_rgb_image(rotated)
}

//! Normalized box geometry.
//!
//! Boxes are stored as fractions of the processed (rotated) image so they
//! survive any change of display size. (0.0, 0.0) is the top-left corner and
//! (1.0, 1.0) the bottom-right one.

use serde::{Deserialize, Serialize};

/// A box in normalized image coordinates.
///
/// Interactive edits may leave a rect out of frame or with negative extent;
/// [`NormalizedRect::clamped`] is applied when a label is saved.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl NormalizedRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Bring the rect inside the unit frame.
    ///
    /// Negative extents (a box dragged up or left) are flipped first, then
    /// `x, y` are clamped to `[0, 1]` and `w, h` shrunk so that
    /// `x + w <= 1` and `y + h <= 1`. Non-finite values become 0.
    pub fn clamped(&self) -> Self {
        let (x, w) = clamp_axis(self.x, self.w);
        let (y, h) = clamp_axis(self.y, self.h);
        Self { x, y, w, h }
    }

    /// Whether the save-time invariant holds.
    pub fn is_within_frame(&self) -> bool {
        let axis_ok = |pos: f64, len: f64| {
            (0.0..=1.0).contains(&pos) && len >= 0.0 && pos + len <= 1.0 + f64::EPSILON
        };
        axis_ok(self.x, self.w) && axis_ok(self.y, self.h)
    }

    /// Convert to pixel coordinates of a `width x height` image.
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelRect {
        let (fw, fh) = (width as f64, height as f64);
        PixelRect {
            x: self.x * fw,
            y: self.y * fh,
            w: self.w * fw,
            h: self.h * fh,
        }
    }
}

fn clamp_axis(pos: f64, len: f64) -> (f64, f64) {
    let pos = if pos.is_finite() { pos } else { 0.0 };
    let len = if len.is_finite() { len } else { 0.0 };
    let (pos, len) = if len < 0.0 { (pos + len, -len) } else { (pos, len) };
    let start = pos.clamp(0.0, 1.0);
    // Whatever was cut off before 0 is lost from the extent.
    let len = (len - (start - pos)).clamp(0.0, 1.0 - start);
    (start, len)
}

/// A box in (fractional) pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl PixelRect {
    /// Convert back to normalized coordinates of a `width x height` image.
    pub fn to_normalized(&self, width: u32, height: u32) -> NormalizedRect {
        let fw = f64::from(width.max(1));
        let fh = f64::from(height.max(1));
        NormalizedRect {
            x: self.x / fw,
            y: self.y / fh,
            w: self.w / fw,
            h: self.h / fh,
        }
    }

    /// Round to whole pixels inside a `width x height` frame.
    ///
    /// Returns `(left, top, width, height)`, or `None` when the rect covers
    /// no whole pixel.
    pub fn snap(&self, frame_width: u32, frame_height: u32) -> Option<(u32, u32, u32, u32)> {
        let (left, right) = snap_axis(self.x, self.w, frame_width)?;
        let (top, bottom) = snap_axis(self.y, self.h, frame_height)?;
        Some((left, top, right - left, bottom - top))
    }
}

fn snap_axis(pos: f64, len: f64, limit: u32) -> Option<(u32, u32)> {
    if limit == 0 || !pos.is_finite() || !len.is_finite() {
        return None;
    }
    let limit = f64::from(limit);
    let start = pos.round().clamp(0.0, limit);
    let end = (pos + len).round().clamp(start, limit);
    if end - start < 1.0 {
        return None;
    }
    Some((start as u32, end as u32))
}

//! Display transforms: rotation and box overlay.
//!
//! The processed tier is always produced in this order:
//! 1. Quarter-turn rotation of the preprocessed image
//! 2. Box outlines, placed using the *rotated* dimensions
//!
//! # Coordinate System
//!
//! - Rotation is clockwise in multiples of 90 degrees
//! - Box coordinates are normalized (0.0 to 1.0) relative to the rotated image
//! - Origin is top-left corner

mod overlay;
mod rotation;

pub use overlay::{draw_regions, OverlayStyle};
pub use rotation::{apply_rotation, Rotation};

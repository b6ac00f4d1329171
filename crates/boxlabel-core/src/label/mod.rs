//! Label data model.
//!
//! An image's label is a list of [`BoxRecord`]s plus a display rotation.
//! A record is either a real region (normalized rect + field values) or the
//! image-level field values used when no region exists. The list is never
//! empty once normalized.

mod fields;
mod geometry;
mod image_label;
mod record;

pub use fields::{Field, FieldKind, FieldSet};
pub use geometry::{NormalizedRect, PixelRect};
pub use image_label::{ImageLabel, LabelError};
pub use record::{BoxRecord, FieldValue, FieldValues, RegionBox};

//! Source image decoding for Boxlabel.
//!
//! This module provides functionality for:
//! - Recognizing source images by extension (jpg/jpeg/png/gif/webp)
//! - Reading dimensions and EXIF orientation without a full decode
//! - Decoding to upright RGB
//! - Fit-inside resizing (never enlarges)

mod format;
mod resize;
mod source;
mod types;

pub use format::{derived_file_name, is_source_image, SourceFormat, DERIVED_EXTENSION};
pub use resize::{fit_inside, resize, resize_to_fit};
pub use source::{decode_source, decode_upright, read_meta};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation, SourceMeta};

//! Image encoding for the derived tiers.
//!
//! This module provides functionality for:
//! - Encoding RGB images to JPEG with a given quality
//! - Compressing source images into the preprocessed tier under a byte and
//!   pixel budget
//!
//! # Examples
//!
//! ```ignore
//! use boxlabel_core::encode::{compress, CompressPolicy};
//!
//! let source = std::fs::read("raw/photo.png").unwrap();
//! let out = compress(&source, &CompressPolicy::default()).unwrap();
//! println!("{}x{} at q{} ({} bytes)", out.width, out.height, out.quality, out.bytes.len());
//! ```

mod budget;
mod jpeg;

pub use budget::{
    compress, compress_image, CompressError, CompressPolicy, Compressed, EncodeAttempt, MIB,
};
pub use jpeg::{encode_image, encode_jpeg, EncodeError};

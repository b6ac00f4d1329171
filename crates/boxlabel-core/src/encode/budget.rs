//! Size-budget compression for the preprocessed tier.
//!
//! # Algorithm
//!
//! A source is *reduced* when its file size exceeds the byte budget or its
//! longest edge exceeds `max_edge`. Reduction first fits the image inside a
//! `max_edge` square (never enlarging), then encodes at `initial_quality`
//! and lowers the quality by `quality_step` until the output fits the budget
//! or the next step would go below `quality_floor`.
//!
//! Sources that need no reduction are re-encoded once at
//! `passthrough_quality` so every derived file has the same format.
//!
//! When the floor is reached without meeting the budget, the smallest
//! encoding seen is returned with `budget_met == false`; the caller decides
//! how loudly to complain.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{encode_image, EncodeError};
use crate::decode::{
    decode_source, read_meta, resize_to_fit, DecodeError, DecodedImage, FilterType, SourceMeta,
};

/// One mebibyte.
pub const MIB: usize = 1024 * 1024;

/// Errors from [`compress`].
#[derive(Debug, Error)]
pub enum CompressError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Thresholds for the preprocessed tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressPolicy {
    /// Maximum output size in bytes.
    pub byte_budget: usize,
    /// Maximum output edge length in pixels.
    pub max_edge: u32,
    /// First quality tried when reducing.
    pub initial_quality: u8,
    /// Quality decrement per attempt.
    pub quality_step: u8,
    /// Lowest quality the loop will try (inclusive).
    pub quality_floor: u8,
    /// Quality for sources that need no reduction.
    pub passthrough_quality: u8,
    /// Downscale filter.
    pub filter: FilterType,
}

impl Default for CompressPolicy {
    fn default() -> Self {
        Self {
            byte_budget: 2 * MIB,
            max_edge: 1920,
            initial_quality: 90,
            quality_step: 5,
            quality_floor: 50,
            passthrough_quality: 95,
            filter: FilterType::Lanczos3,
        }
    }
}

impl CompressPolicy {
    /// Whether a source has to go through the resize and quality loop.
    pub fn needs_reduction(&self, meta: &SourceMeta) -> bool {
        meta.byte_len > self.byte_budget || meta.long_edge() > self.max_edge
    }
}

/// Quality and size of one encoder pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeAttempt {
    pub quality: u8,
    pub byte_len: usize,
}

/// Result of compressing one source image.
#[derive(Debug, Clone)]
pub struct Compressed {
    /// JPEG bytes to write to the preprocessed tier.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Quality of the returned encoding.
    pub quality: u8,
    /// The source went through the reduction path.
    pub reduced: bool,
    /// The output is smaller than the source in pixels.
    pub resized: bool,
    /// `bytes.len() <= byte_budget`.
    pub budget_met: bool,
    /// Every encoder pass, in the order tried.
    pub attempts: Vec<EncodeAttempt>,
}

/// Compress encoded source bytes under `policy`.
///
/// # Errors
///
/// Returns `CompressError::Decode` for unreadable sources and
/// `CompressError::Encode` if the encoder fails.
pub fn compress(source: &[u8], policy: &CompressPolicy) -> Result<Compressed, CompressError> {
    let meta = read_meta(source)?;
    let image = decode_source(source)?;
    compress_image(&image, &meta, policy)
}

/// Compress an already decoded (upright) source described by `meta`.
pub fn compress_image(
    image: &DecodedImage,
    meta: &SourceMeta,
    policy: &CompressPolicy,
) -> Result<Compressed, CompressError> {
    if !policy.needs_reduction(meta) {
        let bytes = encode_image(image, policy.passthrough_quality)?;
        let byte_len = bytes.len();
        return Ok(Compressed {
            bytes,
            width: image.width,
            height: image.height,
            quality: policy.passthrough_quality,
            reduced: false,
            resized: false,
            budget_met: byte_len <= policy.byte_budget,
            attempts: vec![EncodeAttempt {
                quality: policy.passthrough_quality,
                byte_len,
            }],
        });
    }

    let fitted = resize_to_fit(image, policy.max_edge, policy.filter)?;
    let resized = (fitted.width, fitted.height) != (image.width, image.height);
    let step = policy.quality_step.max(1);

    let mut attempts = Vec::new();
    let mut quality = policy.initial_quality;
    let mut smallest: Option<(u8, Vec<u8>)> = None;

    loop {
        let bytes = encode_image(&fitted, quality)?;
        attempts.push(EncodeAttempt {
            quality,
            byte_len: bytes.len(),
        });

        if bytes.len() <= policy.byte_budget {
            smallest = Some((quality, bytes));
            break;
        }

        if smallest
            .as_ref()
            .is_none_or(|(_, best)| bytes.len() <= best.len())
        {
            smallest = Some((quality, bytes));
        }

        match quality.checked_sub(step) {
            Some(next) if next >= policy.quality_floor => quality = next,
            _ => break,
        }
    }

    let (quality, bytes) = smallest.ok_or(EncodeError::EncodingFailed(
        "no encoder attempt was made".to_string(),
    ))?;
    let budget_met = bytes.len() <= policy.byte_budget;

    Ok(Compressed {
        bytes,
        width: fitted.width,
        height: fitted.height,
        quality,
        reduced: true,
        resized,
        budget_met,
        attempts,
    })
}

//! 64-bit average hash (aHash).
//!
//! The image is resampled to 8x8 with a bilinear (triangle) filter, each
//! sample is reduced to luminance `0.299 R + 0.587 G + 0.114 B`, and bit `i`
//! (row-major) is set when sample `i` is strictly greater than the mean of
//! all 64 samples.

use image::imageops::{self, FilterType};

use super::HashingError;
use crate::types::PerceptualHash;

/// Side length of the resampled grid.
pub const GRID: u32 = 8;

/// Computes the aHash, surfacing decode failures.
pub fn try_perceptual_hash(bytes: &[u8]) -> Result<PerceptualHash, HashingError> {
    let img = image::load_from_memory(bytes).map_err(|e| HashingError::Decode(e.to_string()))?;
    let small = imageops::resize(&img.to_rgb8(), GRID, GRID, FilterType::Triangle);

    let luma: Vec<f64> = small
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)
        })
        .collect();
    let mean = luma.iter().sum::<f64>() / luma.len() as f64;

    Ok(PerceptualHash::from_bits(
        luma.iter().map(|&v| v > mean).collect(),
    ))
}

/// Computes the aHash, or `None` when the bytes are not a decodable image.
pub fn compute_perceptual_hash(bytes: &[u8]) -> Option<PerceptualHash> {
    match try_perceptual_hash(bytes) {
        Ok(hash) => Some(hash),
        Err(e) => {
            tracing::debug!(error = %e, "perceptual hash unavailable");
            None
        }
    }
}

//! Bit-level comparison of perceptual hashes.

use crate::types::PerceptualHash;

/// Number of differing bits over the overlapping prefix of `a` and `b`.
pub fn hamming_distance(a: &PerceptualHash, b: &PerceptualHash) -> usize {
    a.bits()
        .iter()
        .zip(b.bits())
        .filter(|(x, y)| x != y)
        .count()
}

/// Similarity as a rounded integer percentage, `round(100 * (1 - d / len))`,
/// where `len` is the overlapping bit length.
///
/// Hashes with no overlap are 0% similar.
pub fn similarity_percent(a: &PerceptualHash, b: &PerceptualHash) -> u8 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0;
    }
    let same = len - hamming_distance(a, b);
    (100.0 * same as f64 / len as f64).round() as u8
}

//! Verification of unknown media against the registry.
//!
//! - `similarity`: Hamming distance and rounded similarity percentages,
//! - `classifier`: the pure exact -> perceptual -> not-found decision,
//! - `verifier`: the remote flow that feeds the classifier from the
//!   registry service.

pub mod classifier;
pub mod similarity;
pub mod verifier;

pub use classifier::{Classifier, VerificationResult, VerificationStatus};
pub use similarity::{hamming_distance, similarity_percent};
pub use verifier::{Verification, Verifier};

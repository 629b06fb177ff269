//! Submission verdicts
//!
//! The verdict state machine and the output normalization used to compare
//! program output with expected output.

pub mod normalize;
pub mod verdict;

pub use normalize::{normalize_output, outputs_match};
pub use verdict::Verdict;

//! Confidence scoring for photo-map calibration anchors.
//!
//! All scores are computed over a window of smoothed GPS fixes collected while
//! the user stands at an anchor, and map into `[0, 1]`:
//! - [`stability_score`]: GPS dispersion around the anchor's claimed position,
//!   usable as soon as anchor A exists.
//! - [`point_a_quality`]: dispersion combined with how well the fixes project
//!   back onto anchor A's pixel once both anchors define a transform.
//! - [`point_c_quality`] and [`refine_point_b`]: a third-point check and a
//!   proportional correction of anchor B. Nothing in the calibration workflow
//!   drives them yet.
//!
//! Every function is pure and deterministic; too few samples yield
//! [`QualityOutcome::Insufficient`] rather than a zero score.

mod params;
mod point_c;
mod score;
mod stats;

pub use params::QualityParams;
pub use point_c::{point_c_quality, refine_point_b};
pub use score::{
    point_a_quality, stability_score, ProjectionScore, QualityKind, QualityOutcome, QualityResult,
    StabilityScore,
};
pub use stats::{clamp01, mean, population_std_dev};

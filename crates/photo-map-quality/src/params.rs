use serde::{Deserialize, Serialize};

/// Tunables for calibration scoring.
///
/// The two lock thresholds are independent: the stability-only check measures
/// GPS dispersion alone, the full check also measures projection accuracy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityParams {
    /// Fewer samples than this yield [`crate::QualityOutcome::Insufficient`].
    pub min_samples: usize,
    /// Standard deviation (meters) of sample distances at which stability reaches 0.
    pub dispersion_scale_m: f64,
    /// Mean reprojection error (pixels) at which the anchor-A projection score reaches 0.
    pub pixel_error_scale: f64,
    /// Mean reprojection error (pixels) at which the point-C score reaches 0.
    pub point_c_error_scale: f64,
    pub stability_weight: f64,
    pub projection_weight: f64,
    /// Lock threshold for the stability-only score.
    pub stability_lock_threshold: f64,
    /// Lock threshold for the combined anchor-A score.
    pub quality_lock_threshold: f64,
    /// Error charged to a sample whose projection fails.
    pub projection_failure_penalty_px: f64,
    /// Fraction of the point-C error applied to anchor B per refinement step.
    pub refine_gain: f64,
}

impl Default for QualityParams {
    fn default() -> Self {
        Self {
            min_samples: 10,
            dispersion_scale_m: 15.0,
            pixel_error_scale: 20.0,
            point_c_error_scale: 40.0,
            stability_weight: 0.4,
            projection_weight: 0.6,
            stability_lock_threshold: 0.85,
            quality_lock_threshold: 0.85,
            projection_failure_penalty_px: 999.0,
            refine_gain: 0.15,
        }
    }
}

//! Third-point validation and anchor-B refinement.
//!
//! A point C is a landmark the user taps after calibration; comparing where
//! its GPS fixes project against where it was tapped measures the transform
//! away from both anchors. The workflow reserves a step for this but no
//! transition reaches it.

use crate::score::{check_sample_count, reprojection, QualityKind, QualityOutcome, QualityResult};
use crate::QualityParams;
use photo_map_core::{GeoPoint, ImagePoint};

/// Score how well samples taken at point C project onto its tapped pixel.
///
/// `score = clamp(1 - mean_error / point_c_error_scale)`. Locked uses the
/// combined-quality threshold.
pub fn point_c_quality<F>(
    samples: &[GeoPoint],
    claimed_image: ImagePoint,
    project: F,
    params: &QualityParams,
) -> QualityOutcome
where
    F: Fn(GeoPoint) -> Option<ImagePoint>,
{
    if let Err(insufficient) = check_sample_count(samples.len(), params) {
        return insufficient;
    }

    let p = reprojection(
        samples,
        claimed_image,
        project,
        params.point_c_error_scale,
        params,
    );
    QualityOutcome::Scored(QualityResult {
        kind: QualityKind::PointC,
        score: p.score,
        locked: p.score >= params.quality_lock_threshold,
        samples: samples.len(),
        stability: None,
        projection: Some(p),
    })
}

/// Nudge anchor B's pixel by `gain` times the observed point-C error.
///
/// The error is `tapped_c - projected_c`; repeated steps converge when the
/// transform's sensitivity to B is close to one.
pub fn refine_point_b(
    b_image: ImagePoint,
    tapped_c: ImagePoint,
    projected_c: ImagePoint,
    gain: f64,
) -> ImagePoint {
    let err = projected_c.vector_to(tapped_c);
    ImagePoint::new(b_image.x + err.x * gain, b_image.y + err.y * gain)
}

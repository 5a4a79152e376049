use crate::stats::{clamp01, mean, population_std_dev};
use crate::QualityParams;
use log::debug;
use photo_map_core::{haversine_m, GeoPoint, ImagePoint};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Which scoring function produced a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityKind {
    Stability,
    PointA,
    PointC,
}

/// GPS dispersion around the claimed position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StabilityScore {
    pub score: f64,
    /// Population standard deviation of sample-to-anchor distances, meters.
    pub sigma_m: f64,
}

/// Agreement between projected samples and the claimed pixel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionScore {
    pub score: f64,
    pub mean_error_px: f64,
    /// Samples whose projection failed and were charged the penalty.
    pub failed_projections: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityResult {
    pub kind: QualityKind,
    /// Composite score in `[0, 1]`.
    pub score: f64,
    pub locked: bool,
    pub samples: usize,
    pub stability: Option<StabilityScore>,
    pub projection: Option<ProjectionScore>,
}

/// Scoring outcome. A zero score and "not enough data" are different things.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QualityOutcome {
    Scored(QualityResult),
    Insufficient { have: usize, need: usize },
}

impl QualityOutcome {
    #[inline]
    pub fn result(&self) -> Option<&QualityResult> {
        match self {
            QualityOutcome::Scored(r) => Some(r),
            QualityOutcome::Insufficient { .. } => None,
        }
    }

    /// Composite score; 0 when insufficient.
    #[inline]
    pub fn score(&self) -> f64 {
        self.result().map_or(0.0, |r| r.score)
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.result().is_some_and(|r| r.locked)
    }
}

pub(crate) fn check_sample_count(
    samples: usize,
    params: &QualityParams,
) -> Result<(), QualityOutcome> {
    let need = params.min_samples.max(1);
    if samples < need {
        return Err(QualityOutcome::Insufficient {
            have: samples,
            need,
        });
    }
    Ok(())
}

fn stability(samples: &[GeoPoint], claimed: GeoPoint, params: &QualityParams) -> StabilityScore {
    let distances: Vec<f64> = samples.iter().map(|&p| haversine_m(p, claimed)).collect();
    let sigma_m = population_std_dev(&distances).unwrap_or(0.0);
    StabilityScore {
        score: clamp01(1.0 - sigma_m / params.dispersion_scale_m),
        sigma_m,
    }
}

/// Mean pixel distance between projected samples and `target`.
pub(crate) fn reprojection<F>(
    samples: &[GeoPoint],
    target: ImagePoint,
    project: F,
    error_scale: f64,
    params: &QualityParams,
) -> ProjectionScore
where
    F: Fn(GeoPoint) -> Option<ImagePoint>,
{
    let mut failed_projections = 0;
    let errors: Vec<f64> = samples
        .iter()
        .map(|&p| match project(p) {
            Some(img) if img.is_finite() => img.distance(target),
            _ => {
                failed_projections += 1;
                params.projection_failure_penalty_px
            }
        })
        .collect();
    let mean_error_px = mean(&errors).unwrap_or(params.projection_failure_penalty_px);
    ProjectionScore {
        score: clamp01(1.0 - mean_error_px / error_scale),
        mean_error_px,
        failed_projections,
    }
}

/// Stability-only score for anchor A before anchor B exists.
///
/// `score = clamp(1 - σ / dispersion_scale_m)` where σ is the population
/// standard deviation of haversine distances from each sample to `claimed`.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(samples, params), fields(samples = samples.len())))]
pub fn stability_score(
    samples: &[GeoPoint],
    claimed: GeoPoint,
    params: &QualityParams,
) -> QualityOutcome {
    if let Err(insufficient) = check_sample_count(samples.len(), params) {
        return insufficient;
    }

    let s = stability(samples, claimed, params);
    let locked = s.score >= params.stability_lock_threshold;
    debug!(
        "stability: n={} sigma={:.2}m score={:.3} locked={}",
        samples.len(),
        s.sigma_m,
        s.score,
        locked
    );

    QualityOutcome::Scored(QualityResult {
        kind: QualityKind::Stability,
        score: s.score,
        locked,
        samples: samples.len(),
        stability: Some(s),
        projection: None,
    })
}

/// Full anchor-A score once a transform exists.
///
/// Combines the stability score with a projection score,
/// `clamp(1 - mean_error / pixel_error_scale)`, where each sample is pushed
/// through `project` and compared against `claimed_image`. Samples that fail to
/// project are charged `projection_failure_penalty_px` instead of being skipped.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(samples, project, params), fields(samples = samples.len())))]
pub fn point_a_quality<F>(
    samples: &[GeoPoint],
    claimed_world: GeoPoint,
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

    let s = stability(samples, claimed_world, params);
    let p = reprojection(
        samples,
        claimed_image,
        project,
        params.pixel_error_scale,
        params,
    );
    let score = params.stability_weight * s.score + params.projection_weight * p.score;
    let locked = score >= params.quality_lock_threshold;
    debug!(
        "point A quality: n={} sigma={:.2}m err={:.1}px score={:.3} locked={}",
        samples.len(),
        s.sigma_m,
        p.mean_error_px,
        score,
        locked
    );

    QualityOutcome::Scored(QualityResult {
        kind: QualityKind::PointA,
        score,
        locked,
        samples: samples.len(),
        stability: Some(s),
        projection: Some(p),
    })
}

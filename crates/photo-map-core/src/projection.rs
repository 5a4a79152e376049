use crate::geodesy::tangent_plane_offset;
use crate::{AnchorId, CalibrationAnchor, GeoPoint, ImagePoint};
use log::{debug, warn};
use nalgebra::{Point2, Rotation2, Vector2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Why two anchors cannot define a transform.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateGeometry {
    #[error("anchors coincide in image space")]
    CoincidentImagePoints,
    #[error("anchors coincide in world space")]
    CoincidentWorldPoints,
    #[error("scale is not a finite positive number")]
    InvalidScale,
    #[error("rotation is not finite")]
    InvalidRotation,
}

/// Scale + rotation + translation from the local tangent plane around
/// `origin_world` into image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityTransform {
    /// Pixels per meter, strictly positive.
    pub scale: f64,
    /// Image-space angle minus world-space angle of the A→B vector. Not normalized.
    pub rotation_radians: f64,
    pub origin_image: ImagePoint,
    pub origin_world: GeoPoint,
}

impl SimilarityTransform {
    /// Derive the transform from two correspondences, with `a` as the origin.
    pub fn from_anchors(
        a: &CalibrationAnchor,
        b: &CalibrationAnchor,
    ) -> Result<Self, DegenerateGeometry> {
        let image_ab = a.image.vector_to(b.image);
        let world_ab = tangent_plane_offset(a.world, b.world);

        let image_len = image_ab.norm();
        let world_len = world_ab.norm();
        if image_len == 0.0 {
            return Err(DegenerateGeometry::CoincidentImagePoints);
        }
        if world_len == 0.0 {
            return Err(DegenerateGeometry::CoincidentWorldPoints);
        }

        let scale = image_len / world_len;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(DegenerateGeometry::InvalidScale);
        }

        let rotation_radians = image_ab.y.atan2(image_ab.x) - world_ab.y.atan2(world_ab.x);
        if !rotation_radians.is_finite() {
            return Err(DegenerateGeometry::InvalidRotation);
        }

        Ok(Self {
            scale,
            rotation_radians,
            origin_image: a.image,
            origin_world: a.world,
        })
    }

    /// Map a GPS position into image pixels.
    #[inline]
    pub fn apply(&self, world: GeoPoint) -> ImagePoint {
        let meters = tangent_plane_offset(self.origin_world, world);
        let rotated: Vector2<f64> = Rotation2::new(self.rotation_radians) * meters;
        let origin: Point2<f64> = self.origin_image.into();
        (origin + rotated * self.scale).into()
    }

    /// Rotation in degrees, for display.
    #[inline]
    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_radians.to_degrees()
    }
}

/// Outcome of [`GeoProjection::compute`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Ready(SimilarityTransform),
    /// At least one anchor is missing.
    NotReady,
    Degenerate(DegenerateGeometry),
}

impl Projection {
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Projection::Ready(_))
    }

    #[inline]
    pub fn transform(&self) -> Option<&SimilarityTransform> {
        match self {
            Projection::Ready(t) => Some(t),
            _ => None,
        }
    }
}

/// Transform parameters exposed for debug displays.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionDebug {
    pub scale: f64,
    pub rotation_radians: f64,
    pub rotation_degrees: f64,
    pub origin_image: ImagePoint,
    pub origin_world: GeoPoint,
}

impl From<&SimilarityTransform> for ProjectionDebug {
    fn from(t: &SimilarityTransform) -> Self {
        Self {
            scale: t.scale,
            rotation_radians: t.rotation_radians,
            rotation_degrees: t.rotation_degrees(),
            origin_image: t.origin_image,
            origin_world: t.origin_world,
        }
    }
}

/// Two calibration anchors and the transform derived from them.
///
/// Setting an anchor never recomputes; it drops any previous transform until
/// [`GeoProjection::compute`] succeeds again.
#[derive(Clone, Debug, Default)]
pub struct GeoProjection {
    anchor_a: Option<CalibrationAnchor>,
    anchor_b: Option<CalibrationAnchor>,
    transform: Option<SimilarityTransform>,
}

impl GeoProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget both anchors and the transform.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_anchor_a(&mut self, image: ImagePoint, world: GeoPoint) {
        self.set_anchor(AnchorId::A, CalibrationAnchor::new(image, world));
    }

    pub fn set_anchor_b(&mut self, image: ImagePoint, world: GeoPoint) {
        self.set_anchor(AnchorId::B, CalibrationAnchor::new(image, world));
    }

    pub fn set_anchor(&mut self, id: AnchorId, anchor: CalibrationAnchor) {
        match id {
            AnchorId::A => self.anchor_a = Some(anchor),
            AnchorId::B => self.anchor_b = Some(anchor),
        }
        self.transform = None;
    }

    #[inline]
    pub fn anchor(&self, id: AnchorId) -> Option<&CalibrationAnchor> {
        match id {
            AnchorId::A => self.anchor_a.as_ref(),
            AnchorId::B => self.anchor_b.as_ref(),
        }
    }

    #[inline]
    pub fn anchor_a(&self) -> Option<&CalibrationAnchor> {
        self.anchor_a.as_ref()
    }

    #[inline]
    pub fn anchor_b(&self) -> Option<&CalibrationAnchor> {
        self.anchor_b.as_ref()
    }

    /// Derive the transform from the current anchors.
    ///
    /// On anything but [`Projection::Ready`] the transform is left unset.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn compute(&mut self) -> Projection {
        self.transform = None;
        let (Some(a), Some(b)) = (self.anchor_a.as_ref(), self.anchor_b.as_ref()) else {
            return Projection::NotReady;
        };

        match SimilarityTransform::from_anchors(a, b) {
            Ok(t) => {
                debug!(
                    "transform ready: scale={:.4} px/m rotation={:.2} deg",
                    t.scale,
                    t.rotation_degrees()
                );
                self.transform = Some(t);
                Projection::Ready(t)
            }
            Err(reason) => {
                warn!("calibration degenerate: {reason}");
                Projection::Degenerate(reason)
            }
        }
    }

    #[inline]
    pub fn transform(&self) -> Option<&SimilarityTransform> {
        self.transform.as_ref()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.transform.is_some()
    }

    /// Project a GPS position into the image. `None` until a transform exists.
    #[inline]
    pub fn project(&self, world: GeoPoint) -> Option<ImagePoint> {
        self.transform.as_ref().map(|t| t.apply(world))
    }

    pub fn debug_snapshot(&self) -> Option<ProjectionDebug> {
        self.transform.as_ref().map(ProjectionDebug::from)
    }
}

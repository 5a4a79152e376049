use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A GPS position in degrees. No altitude.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// A position in image pixel space, origin top-left, y growing downwards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

impl ImagePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance in pixels.
    #[inline]
    pub fn distance(&self, other: ImagePoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Displacement `other - self`.
    #[inline]
    pub fn vector_to(&self, other: ImagePoint) -> Vector2<f64> {
        Vector2::new(other.x - self.x, other.y - self.y)
    }
}

impl From<ImagePoint> for Point2<f64> {
    fn from(p: ImagePoint) -> Self {
        Point2::new(p.x, p.y)
    }
}

impl From<Point2<f64>> for ImagePoint {
    fn from(p: Point2<f64>) -> Self {
        Self::new(p.x, p.y)
    }
}

/// Which of the two calibration anchors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorId {
    A,
    B,
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorId::A => f.write_str("A"),
            AnchorId::B => f.write_str("B"),
        }
    }
}

/// One tapped correspondence between the map image and the GPS position the
/// user was standing at when tapping.
///
/// The serialized field for the GPS side is `world`; `gps` is accepted on input.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationAnchor {
    pub image: ImagePoint,
    #[serde(alias = "gps")]
    pub world: GeoPoint,
}

impl CalibrationAnchor {
    pub const fn new(image: ImagePoint, world: GeoPoint) -> Self {
        Self { image, world }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.image.is_finite() && self.world.is_finite()
    }
}

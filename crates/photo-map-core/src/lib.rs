//! Core types and geometry for aligning a photographed map with GPS.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about rendering, gestures, or persistence. It provides:
//! - anchor types pairing an image pixel with a GPS position,
//! - the two-anchor similarity projection from GPS into image space,
//! - a bounded moving-average GPS smoother and a walking-speed gate.
//!
//! ## Quickstart
//!
//! ```
//! use photo_map_core::{GeoPoint, GeoProjection, ImagePoint};
//!
//! let mut projection = GeoProjection::new();
//! projection.set_anchor_a(ImagePoint::new(100.0, 100.0), GeoPoint::new(10.0, 20.0));
//! projection.set_anchor_b(ImagePoint::new(200.0, 100.0), GeoPoint::new(10.0, 20.001));
//! assert!(projection.compute().is_ready());
//!
//! let here = projection.project(GeoPoint::new(10.0, 20.0005)).expect("calibrated");
//! assert!((here.x - 150.0).abs() < 1e-6);
//! ```

mod geodesy;
mod logger;
mod projection;
mod smoother;
mod types;

pub use geodesy::{
    haversine_m, tangent_plane_offset, MEAN_EARTH_RADIUS_M, WGS84_EQUATORIAL_RADIUS_M,
};
pub use projection::{
    DegenerateGeometry, GeoProjection, Projection, ProjectionDebug, SimilarityTransform,
};
pub use smoother::{GpsSmoother, RawFix, SpeedGate, DEFAULT_SMOOTHER_WINDOW, MAX_WALKING_SPEED_MPS};
pub use types::{AnchorId, CalibrationAnchor, GeoPoint, ImagePoint};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level};

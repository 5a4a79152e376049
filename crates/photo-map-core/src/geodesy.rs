//! Small-area geodesy: local tangent plane and great-circle distance.

use crate::GeoPoint;
use nalgebra::Vector2;

/// Radius used for the tangent-plane approximation (WGS84 semi-major axis).
pub const WGS84_EQUATORIAL_RADIUS_M: f64 = 6_378_137.0;

/// Radius used for haversine distances.
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Offset of `p` from `origin` in local tangent-plane meters.
///
/// Returns `(east, south)`: the second component is negated northing so the
/// plane has the same handedness as image space, where y grows downwards.
/// Longitude is scaled by `cos(origin.lat)`; good enough for trekking-sized
/// maps, meaningless across the antimeridian.
#[inline]
pub fn tangent_plane_offset(origin: GeoPoint, p: GeoPoint) -> Vector2<f64> {
    let lat0 = origin.lat.to_radians();
    let d_lat = (p.lat - origin.lat).to_radians();
    let d_lon = (p.lon - origin.lon).to_radians();

    let east = d_lon * WGS84_EQUATORIAL_RADIUS_M * lat0.cos();
    let north = d_lat * WGS84_EQUATORIAL_RADIUS_M;
    Vector2::new(east, -north)
}

/// Great-circle distance in meters (haversine on a sphere of radius
/// [`MEAN_EARTH_RADIUS_M`]).
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn one_degree_of_longitude_on_equator() {
        let d = haversine_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 200.0, "got {d}");
    }

    #[test]
    fn haversine_is_zero_for_identical_points() {
        let p = GeoPoint::new(45.8326, 6.8652);
        assert_eq!(haversine_m(p, p), 0.0);
    }

    #[test]
    fn north_maps_to_negative_y() {
        let origin = GeoPoint::new(10.0, 20.0);
        let north = GeoPoint::new(10.001, 20.0);
        let v = tangent_plane_offset(origin, north);
        assert_abs_diff_eq!(v.x, 0.0, epsilon = 1e-9);
        assert!(v.y < 0.0);
        assert_abs_diff_eq!(
            -v.y,
            0.001_f64.to_radians() * WGS84_EQUATORIAL_RADIUS_M,
            epsilon = 1e-9
        );
    }

    #[test]
    fn longitude_shrinks_with_latitude() {
        let equator = tangent_plane_offset(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01));
        let alps = tangent_plane_offset(GeoPoint::new(60.0, 0.0), GeoPoint::new(60.0, 0.01));
        assert_abs_diff_eq!(alps.x, equator.x * 0.5, epsilon = 1e-6);
    }
}

//! Moving-average GPS smoothing and the walking-speed ingestion gate.

use crate::GeoPoint;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of raw fixes averaged by [`GpsSmoother`].
pub const DEFAULT_SMOOTHER_WINDOW: usize = 5;

/// Fixes reported faster than this are not someone standing at a landmark.
pub const MAX_WALKING_SPEED_MPS: f64 = 2.5;

/// A raw device fix as delivered by the positioning source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, alias = "speedMetersPerSecond")]
    pub speed_mps: Option<f64>,
}

impl RawFix {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            speed_mps: None,
        }
    }

    pub const fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    #[inline]
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Drops fixes that cannot be trusted as a stationary or walking position.
///
/// A fix without a reported speed passes. Non-finite coordinates never pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedGate {
    pub max_speed_mps: f64,
}

impl Default for SpeedGate {
    fn default() -> Self {
        Self {
            max_speed_mps: MAX_WALKING_SPEED_MPS,
        }
    }
}

impl SpeedGate {
    pub fn new(max_speed_mps: f64) -> Self {
        Self { max_speed_mps }
    }

    pub fn accepts(&self, fix: &RawFix) -> bool {
        if !fix.position().is_finite() {
            return false;
        }
        !matches!(fix.speed_mps, Some(s) if s > self.max_speed_mps)
    }
}

/// Unweighted moving average over the last `capacity` positions.
///
/// The smoother does not reject outliers; gate fixes with [`SpeedGate`] first.
#[derive(Clone, Debug)]
pub struct GpsSmoother {
    capacity: usize,
    buffer: VecDeque<GeoPoint>,
}

impl Default for GpsSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHER_WINDOW)
    }
}

impl GpsSmoother {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            buffer: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn add(&mut self, fix: GeoPoint) {
        self.buffer.push_back(fix);
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
    }

    /// Mean latitude and longitude of the buffered fixes, `None` when empty.
    ///
    /// Running mean, so a buffer of identical fixes returns that fix bit for bit.
    pub fn average(&self) -> Option<GeoPoint> {
        let mut iter = self.buffer.iter();
        let mut mean = *iter.next()?;
        for (k, p) in iter.enumerate() {
            let n = (k + 2) as f64;
            mean.lat += (p.lat - mean.lat) / n;
            mean.lon += (p.lon - mean.lon) / n;
        }
        Some(mean)
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut s = GpsSmoother::new(3);
        for i in 0..7 {
            s.add(GeoPoint::new(i as f64, 0.0));
        }
        assert_eq!(s.len(), 3);
        let avg = s.average().expect("non-empty");
        assert_abs_diff_eq!(avg.lat, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn identical_fixes_average_exactly() {
        let mut s = GpsSmoother::default();
        let p = GeoPoint::new(45.923_456, 6.869_123);
        for _ in 0..DEFAULT_SMOOTHER_WINDOW {
            s.add(p);
        }
        assert_eq!(s.len(), DEFAULT_SMOOTHER_WINDOW);
        assert_eq!(s.average(), Some(p));
    }

    #[test]
    fn reset_empties_buffer() {
        let mut s = GpsSmoother::default();
        s.add(GeoPoint::new(1.0, 2.0));
        s.reset();
        assert!(s.is_empty());
        assert_eq!(s.average(), None);
    }

    #[test]
    fn zero_capacity_keeps_latest_fix() {
        let mut s = GpsSmoother::new(0);
        s.add(GeoPoint::new(1.0, 1.0));
        s.add(GeoPoint::new(2.0, 2.0));
        assert_eq!(s.capacity(), 1);
        assert_eq!(s.average(), Some(GeoPoint::new(2.0, 2.0)));
    }

    #[test]
    fn speed_gate_drops_fast_and_broken_fixes() {
        let gate = SpeedGate::default();
        assert!(gate.accepts(&RawFix::new(1.0, 1.0)));
        assert!(gate.accepts(&RawFix::new(1.0, 1.0).with_speed(2.5)));
        assert!(!gate.accepts(&RawFix::new(1.0, 1.0).with_speed(2.6)));
        assert!(!gate.accepts(&RawFix::new(f64::NAN, 1.0)));
    }

    #[test]
    fn raw_fix_parses_device_speed_field() {
        let fix: RawFix =
            serde_json::from_str(r#"{"lat":1.0,"lon":2.0,"speedMetersPerSecond":3.0}"#)
                .expect("parse");
        assert_eq!(fix.speed_mps, Some(3.0));
    }
}

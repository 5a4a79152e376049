//! Geometry the rendering collaborator needs for markers and map furniture.
//!
//! Nothing here draws; it only derives positions and lengths.

use nalgebra::Vector2;
use photo_map_core::{AnchorId, ImagePoint};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Blue,
    Green,
}

impl MarkerColor {
    pub fn for_anchor(id: AnchorId) -> Self {
        match id {
            AnchorId::A => MarkerColor::Blue,
            AnchorId::B => MarkerColor::Green,
        }
    }
}

/// One anchor marker to draw.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: AnchorId,
    pub image: ImagePoint,
    pub color: MarkerColor,
}

/// Marker closest to `tap` within `radius_px / zoom` image pixels.
///
/// `radius_px` is a screen-space radius; at higher zoom one image pixel covers
/// more screen, so the image-space radius shrinks.
pub fn hit_test(
    markers: &[Marker],
    tap: ImagePoint,
    zoom: f64,
    radius_px: f64,
) -> Option<AnchorId> {
    if !zoom.is_finite() || zoom <= 0.0 {
        return None;
    }
    let radius = radius_px / zoom;
    markers
        .iter()
        .map(|m| (m.id, m.image.distance(tap)))
        .filter(|&(_, d)| d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Image-space unit direction of world north for a transform rotation.
///
/// World north is `(0, -1)` in the tangent plane; rotating it gives
/// `(sin θ, -cos θ)`.
#[inline]
pub fn north_vector(rotation_radians: f64) -> Vector2<f64> {
    Vector2::new(rotation_radians.sin(), -rotation_radians.cos())
}

/// A scale bar of a round length.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleBar {
    pub meters: f64,
    /// Length on screen.
    pub length_px: f64,
}

impl ScaleBar {
    /// Default on-screen width the bar aims for.
    pub const TARGET_PX: f64 = 120.0;

    /// Pick the `{1, 2, 5, 10} × 10^k` meter length whose on-screen width is
    /// closest to `target_px`.
    ///
    /// `px_per_meter` is the transform scale (image pixels per meter) and
    /// `view_zoom` the renderer's image-to-screen zoom.
    pub fn fit(px_per_meter: f64, view_zoom: f64, target_px: f64) -> Option<Self> {
        let screen_px_per_meter = px_per_meter * view_zoom;
        if !screen_px_per_meter.is_finite() || screen_px_per_meter <= 0.0 {
            return None;
        }
        let raw = target_px / screen_px_per_meter;
        if !raw.is_finite() || raw <= 0.0 {
            return None;
        }

        let pow10 = 10f64.powf(raw.log10().floor());
        let meters = [1.0, 2.0, 5.0, 10.0]
            .iter()
            .map(|k| k * pow10)
            .min_by(|a, b| (a - raw).abs().total_cmp(&(b - raw).abs()))?;

        Some(Self {
            meters,
            length_px: meters * screen_px_per_meter,
        })
    }
}

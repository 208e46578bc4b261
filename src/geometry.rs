//! Pure polyline math: geodesic distance, initial bearing, and
//! nearest-point-on-polyline projection.
//!
//! All coordinates are WGS84 `geo::Point<f64>` with x = longitude and
//! y = latitude, matching the rest of the crate.

use crate::{NavError, Result};
use geo::{Bearing, Distance, Haversine, Point};

/// Result of projecting a point onto a route polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// Nearest point on the polyline.
    pub snapped: Point<f64>,
    /// Index of the segment start vertex (0-based).
    pub segment_index: usize,
    /// Geodesic distance from the query point to `snapped`, in meters.
    pub distance_m: f64,
}

/// Geodesic (haversine) distance between two points in meters.
#[inline]
pub fn distance(a: Point<f64>, b: Point<f64>) -> f64 {
    Haversine.distance(a, b)
}

/// Great-circle initial bearing from `a` to `b`, normalized to `[0, 360)`.
///
/// 0° is north, increasing clockwise. Holds for antimeridian-crossing pairs.
#[inline]
pub fn bearing(a: Point<f64>, b: Point<f64>) -> f64 {
    Haversine.bearing(a, b).rem_euclid(360.0)
}

/// Whether both coordinates of a point are finite.
#[inline]
pub fn is_finite(p: Point<f64>) -> bool {
    p.x().is_finite() && p.y().is_finite()
}

/// Project `point` onto the nearest segment of `line`.
///
/// Returns the nearest point, the index of the segment it lies on, and the
/// geodesic distance to it. Fails with [`NavError::DegenerateLine`] when the
/// polyline has fewer than 2 vertices.
///
/// Candidate points are found per segment in a local equirectangular frame
/// (longitude scaled by the cosine of the mean latitude), which is accurate
/// for the short segments of a driving route; the distances that rank the
/// candidates are geodesic.
pub fn nearest_point_on_line(line: &[Point<f64>], point: Point<f64>) -> Result<MatchResult> {
    if line.len() < 2 {
        return Err(NavError::DegenerateLine(line.len()));
    }

    let mut best: Option<MatchResult> = None;

    for (i, pair) in line.windows(2).enumerate() {
        let candidate = project_on_segment(point, pair[0], pair[1]);
        let dist = distance(point, candidate);

        let is_better = match &best {
            Some(prev) => dist < prev.distance_m,
            None => true,
        };

        if is_better {
            best = Some(MatchResult {
                snapped: candidate,
                segment_index: i,
                distance_m: dist,
            });
        }
    }

    let best = best.ok_or_else(|| NavError::InvalidGeometry("no segments".to_string()))?;
    if !best.distance_m.is_finite() || !is_finite(best.snapped) {
        return Err(NavError::InvalidGeometry(
            "non-finite projection result".to_string(),
        ));
    }
    Ok(best)
}

/// Project a point onto the segment `a`–`b`, clamped to the segment.
fn project_on_segment(p: Point<f64>, a: Point<f64>, b: Point<f64>) -> Point<f64> {
    let cos_lat = ((a.y() + b.y()) / 2.0).to_radians().cos();

    let dx = (b.x() - a.x()) * cos_lat;
    let dy = b.y() - a.y();
    let px = (p.x() - a.x()) * cos_lat;
    let py = p.y() - a.y();

    let seg_len_sq = dx * dx + dy * dy;
    if seg_len_sq < 1e-20 {
        // Degenerate segment, the endpoint is the only candidate
        return a;
    }

    let t = ((px * dx + py * dy) / seg_len_sq).clamp(0.0, 1.0);

    Point::new(a.x() + t * (b.x() - a.x()), a.y() + t * (b.y() - a.y()))
}

//! Stable heading estimation.
//!
//! Route-relative bearing beats the raw GPS heading while moving: it does
//! not jitter at low speed or inside turns. When stationary right after a
//! recenter, the map goes north-up until the agent moves again.

use crate::geometry::{self, MatchResult};
use crate::route::RouteGeometry;

/// Derives a stable map bearing from route geometry, raw sensor heading and
/// speed. Owns `stable_deg` (always in `[0, 360)`) and the recenter-pending
/// flag consumed by the north-up rule.
#[derive(Debug, Clone)]
pub struct BearingEstimator {
    stable_deg: f64,
    recenter_pending: bool,
    speed_threshold_mps: f64,
}

impl BearingEstimator {
    pub fn new(speed_threshold_mps: f64) -> Self {
        Self {
            stable_deg: 0.0,
            recenter_pending: false,
            speed_threshold_mps,
        }
    }

    /// Mark that a recenter was requested; the next stationary fixes render
    /// north-up until speed crosses the threshold again.
    pub fn set_recenter_pending(&mut self) {
        self.recenter_pending = true;
    }

    #[inline]
    pub fn recenter_pending(&self) -> bool {
        self.recenter_pending
    }

    /// The last stable bearing, in `[0, 360)`.
    #[inline]
    pub fn stable_deg(&self) -> f64 {
        self.stable_deg
    }

    /// Evaluate one fix and return the bearing the camera should use.
    ///
    /// A missing speed counts as stationary. The stationary north-up value
    /// is returned for the camera but never stored as the stable bearing;
    /// only the moving branch updates it. Non-finite candidates are
    /// discarded, preserving the previous value.
    pub fn update(
        &mut self,
        speed_mps: Option<f64>,
        raw_heading_deg: Option<f64>,
        matched: Option<&MatchResult>,
        route: Option<&RouteGeometry>,
    ) -> f64 {
        let speed = speed_mps.unwrap_or(0.0);

        if self.recenter_pending && speed <= self.speed_threshold_mps {
            return 0.0;
        }

        if speed > self.speed_threshold_mps {
            self.recenter_pending = false;

            let candidate = route_bearing(matched, route)
                .or(raw_heading_deg.filter(|h| h.is_finite()));

            if let Some(deg) = candidate {
                if deg.is_finite() {
                    self.stable_deg = deg.rem_euclid(360.0);
                }
            }
        }

        self.stable_deg
    }
}

/// Bearing along the route at the matched segment.
///
/// Looks ahead to vertex `i + 1`; at the last vertex it falls back to
/// `i - 1`, which points the bearing back along the final segment.
fn route_bearing(matched: Option<&MatchResult>, route: Option<&RouteGeometry>) -> Option<f64> {
    let m = matched?;
    let points = route?.points();

    let lookahead = points.get(m.segment_index + 1).or_else(|| {
        m.segment_index
            .checked_sub(1)
            .and_then(|i| points.get(i))
    })?;

    let deg = geometry::bearing(m.snapped, *lookahead);
    deg.is_finite().then_some(deg)
}

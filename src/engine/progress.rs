//! Throttled route progress tracking.
//!
//! At most once per throttle window the current fix is matched against the
//! active route, the traveled/remaining split is recomputed for the route
//! layers, and the matched distance is checked against the deviation radius.
//! Layer redraw and deviation detection intentionally share this one
//! throttle.

use crate::route::{RouteGeometry, RouteProgress};
use geo::Point;
use tracing::warn;

/// One eligible progress recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Traveled/remaining split to publish as route layers.
    pub progress: RouteProgress,
    /// Matched distance from the fix to the route, in meters.
    pub distance_m: f64,
    /// Whether the matched distance exceeds the deviation radius.
    pub deviated: bool,
}

/// Recomputes route progress on a wall-clock throttle.
///
/// The throttle timer (`last_progress_at_ms`) is distinct from the
/// recalculation throttle's timer; a dispatched recalculation does not delay
/// the next progress redraw.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    last_progress_at_ms: Option<u64>,
    interval_ms: u64,
    deviation_threshold_m: f64,
}

impl ProgressTracker {
    pub fn new(interval_ms: u64, deviation_threshold_m: f64) -> Self {
        Self {
            last_progress_at_ms: None,
            interval_ms,
            deviation_threshold_m,
        }
    }

    /// Recompute progress for the current fix, unless throttled or no route
    /// is active.
    pub fn update(
        &mut self,
        now_ms: u64,
        raw: Point<f64>,
        route: Option<&RouteGeometry>,
    ) -> Option<ProgressUpdate> {
        let route = route?;

        if let Some(last) = self.last_progress_at_ms {
            if now_ms.saturating_sub(last) < self.interval_ms {
                return None;
            }
        }

        let m = match route.match_point(raw) {
            Ok(m) => m,
            Err(err) => {
                warn!(%err, "progress matching failed, keeping previous layers");
                return None;
            }
        };

        self.last_progress_at_ms = Some(now_ms);

        Some(ProgressUpdate {
            progress: route.split_at(&m),
            distance_m: m.distance_m,
            deviated: m.distance_m > self.deviation_threshold_m,
        })
    }

    /// Forget the throttle state, so the next fix recomputes immediately.
    /// Used when a new route replaces the geometry.
    pub fn reset(&mut self) {
        self.last_progress_at_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lat_offset(meters: f64) -> f64 {
        meters / 111_320.0
    }

    fn east_route() -> RouteGeometry {
        RouteGeometry::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.01, 0.0),
            Point::new(0.02, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn no_route_yields_nothing() {
        let mut tracker = ProgressTracker::new(5000, 50.0);
        assert!(tracker.update(0, Point::new(0.0, 0.0), None).is_none());
    }

    #[test]
    fn first_update_is_not_throttled() {
        let route = east_route();
        let mut tracker = ProgressTracker::new(5000, 50.0);
        let update = tracker.update(0, Point::new(0.005, 0.0), Some(&route)).unwrap();
        assert!(!update.deviated);
        assert_eq!(update.progress.traveled.len(), 2);
        assert_eq!(update.progress.remaining.len(), 3);
    }

    #[test]
    fn updates_within_the_window_are_suppressed() {
        let route = east_route();
        let mut tracker = ProgressTracker::new(5000, 50.0);
        let raw = Point::new(0.005, 0.0);

        assert!(tracker.update(0, raw, Some(&route)).is_some());
        assert!(tracker.update(1000, raw, Some(&route)).is_none());
        assert!(tracker.update(4999, raw, Some(&route)).is_none());
        assert!(tracker.update(5000, raw, Some(&route)).is_some());
    }

    #[test]
    fn deviation_flag_tracks_the_radius() {
        let route = east_route();
        let mut tracker = ProgressTracker::new(5000, 50.0);

        let near = tracker
            .update(0, Point::new(0.005, lat_offset(49.0)), Some(&route))
            .unwrap();
        assert!(!near.deviated);

        let far = tracker
            .update(10_000, Point::new(0.005, lat_offset(51.0)), Some(&route))
            .unwrap();
        assert!(far.deviated);
        assert!(far.distance_m > 50.0);
    }

    #[test]
    fn reset_rearms_the_throttle() {
        let route = east_route();
        let mut tracker = ProgressTracker::new(5000, 50.0);
        let raw = Point::new(0.005, 0.0);

        assert!(tracker.update(0, raw, Some(&route)).is_some());
        tracker.reset();
        assert!(tracker.update(1, raw, Some(&route)).is_some());
    }
}

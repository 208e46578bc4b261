//! Snap-to-route map matching.
//!
//! Geometric matching against the active route polyline; there is no road
//! graph here. Within the snap radius the marker target rides the route,
//! beyond it the raw GPS position is trusted.

use crate::geometry::MatchResult;
use crate::route::RouteGeometry;
use geo::Point;
use tracing::warn;

/// Outcome of matching one fix against the active route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matched {
    /// Where the smoothed marker should head.
    pub target: Point<f64>,
    /// The projection result, when a route was available and projectable.
    pub result: Option<MatchResult>,
}

/// Choose the marker target for a raw fix position.
///
/// - No active route: the raw position.
/// - Matched within `snap_threshold_m`: the snapped point.
/// - Matched farther away: the raw position (trust the GPS rather than a
///   parallel road).
/// - Projection failure degrades to the raw position; it is logged, never
///   surfaced.
pub fn match_target(
    raw: Point<f64>,
    route: Option<&RouteGeometry>,
    snap_threshold_m: f64,
) -> Matched {
    let Some(route) = route else {
        return Matched {
            target: raw,
            result: None,
        };
    };

    match route.match_point(raw) {
        Ok(m) => {
            let target = if m.distance_m < snap_threshold_m {
                m.snapped
            } else {
                raw
            };
            Matched {
                target,
                result: Some(m),
            }
        }
        Err(err) => {
            warn!(%err, "snap-to-route failed, using raw position");
            Matched {
                target: raw,
                result: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Degrees of latitude spanning `meters` (1 degree is ~111.32 km).
    fn lat_offset(meters: f64) -> f64 {
        meters / 111_320.0
    }

    fn east_route() -> RouteGeometry {
        RouteGeometry::new(vec![Point::new(0.0, 0.0), Point::new(0.01, 0.0)]).unwrap()
    }

    #[test]
    fn no_route_passes_raw_through() {
        let raw = Point::new(-46.63, -23.55);
        let matched = match_target(raw, None, 30.0);
        assert_eq!(matched.target, raw);
        assert!(matched.result.is_none());
    }

    #[test]
    fn snaps_just_inside_the_threshold() {
        let route = east_route();
        let raw = Point::new(0.005, lat_offset(29.9));
        let matched = match_target(raw, Some(&route), 30.0);

        let m = matched.result.unwrap();
        assert!(m.distance_m < 30.0, "distance {}", m.distance_m);
        assert_eq!(matched.target, m.snapped);
        assert_relative_eq!(matched.target.y(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn keeps_raw_just_outside_the_threshold() {
        let route = east_route();
        let raw = Point::new(0.005, lat_offset(30.1));
        let matched = match_target(raw, Some(&route), 30.0);

        let m = matched.result.unwrap();
        assert!(m.distance_m > 30.0, "distance {}", m.distance_m);
        assert_eq!(matched.target, raw);
    }

    #[test]
    fn fix_exactly_on_route_snaps_to_itself() {
        let route = east_route();
        let raw = Point::new(0.004, 0.0);
        let matched = match_target(raw, Some(&route), 30.0);
        let m = matched.result.unwrap();
        assert!(m.distance_m < 1e-6);
        assert_relative_eq!(matched.target.x(), raw.x(), epsilon = 1e-12);
    }
}

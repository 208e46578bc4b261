//! Route geometry storage and progress splitting.
//!
//! A [`RouteGeometry`] is validated once on construction and immutable
//! afterwards; recalculation replaces it wholesale rather than patching it.

use crate::geometry::{self, MatchResult};
use crate::{NavError, Result};
use geo::Point;

/// An active route polyline: at least 2 finite WGS84 points.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    points: Vec<Point<f64>>,
    /// Cached total length in meters (computed once during construction)
    cached_length_m: f64,
}

/// Traveled/remaining split of a route at a matched position.
///
/// The snap point is shared: it terminates `traveled` and starts `remaining`,
/// so concatenating the two (dropping one copy of the boundary point)
/// reconstructs a polyline topologically consistent with the full route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteProgress {
    /// Route vertices already passed, ending at the snap point.
    pub traveled: Vec<Point<f64>>,
    /// Snap point followed by the route vertices still ahead.
    pub remaining: Vec<Point<f64>>,
}

impl RouteGeometry {
    /// Create a route from an ordered point sequence.
    ///
    /// Fails with [`NavError::EmptyRoute`] on an empty input,
    /// [`NavError::DegenerateLine`] on a single point, and
    /// [`NavError::InvalidGeometry`] when any coordinate is non-finite.
    pub fn new(points: Vec<Point<f64>>) -> Result<Self> {
        match points.len() {
            0 => return Err(NavError::EmptyRoute),
            1 => return Err(NavError::DegenerateLine(1)),
            _ => {}
        }
        if let Some(bad) = points.iter().find(|p| !geometry::is_finite(**p)) {
            return Err(NavError::InvalidGeometry(format!(
                "non-finite route vertex ({}, {})",
                bad.x(),
                bad.y()
            )));
        }

        let cached_length_m = points
            .windows(2)
            .map(|w| geometry::distance(w[0], w[1]))
            .sum();

        Ok(Self {
            points,
            cached_length_m,
        })
    }

    /// The route vertices, in travel order.
    #[inline]
    pub fn points(&self) -> &[Point<f64>] {
        &self.points
    }

    /// Total route length in meters. O(1), cached during construction.
    #[inline]
    pub fn length_m(&self) -> f64 {
        self.cached_length_m
    }

    /// Project a point onto this route.
    #[inline]
    pub fn match_point(&self, point: Point<f64>) -> Result<MatchResult> {
        geometry::nearest_point_on_line(&self.points, point)
    }

    /// Split the route at a matched position into traveled and remaining
    /// parts.
    ///
    /// `traveled` is `points[0..=segment_index]` followed by the snap point;
    /// `remaining` is the snap point followed by `points[segment_index+1..]`.
    pub fn split_at(&self, m: &MatchResult) -> RouteProgress {
        let i = m.segment_index.min(self.points.len() - 2);

        let mut traveled = self.points[..=i].to_vec();
        traveled.push(m.snapped);

        let mut remaining = Vec::with_capacity(self.points.len() - i);
        remaining.push(m.snapped);
        remaining.extend_from_slice(&self.points[i + 1..]);

        RouteProgress {
            traveled,
            remaining,
        }
    }
}

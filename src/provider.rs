//! The Directions Provider boundary.
//!
//! The provider computes a route through an ordered waypoint list. The first
//! waypoint is always the current agent position; the remainder are the
//! destinations in caller-supplied order, which the provider must preserve.

use crate::{Result, route::RouteGeometry};
use geo::Point;
use std::future::Future;

/// Routing profile requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteProfile {
    /// Driving with live traffic.
    DrivingTraffic,
    Driving,
    Walking,
    Cycling,
}

impl RouteProfile {
    /// The profile identifier as used in provider request paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DrivingTraffic => "driving-traffic",
            Self::Driving => "driving",
            Self::Walking => "walking",
            Self::Cycling => "cycling",
        }
    }
}

/// An asynchronous routing backend.
///
/// Failures are reported as [`crate::NavError::Provider`] (non-success
/// response) or [`crate::NavError::NoRoute`] (empty result set); the session
/// treats both the same way: the previous route is retained.
pub trait DirectionsProvider: Send + Sync + 'static {
    /// Compute a route visiting `waypoints` in order.
    fn fetch_route(
        &self,
        waypoints: Vec<Point<f64>>,
        profile: RouteProfile,
    ) -> impl Future<Output = Result<RouteGeometry>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_identifiers_match_provider_paths() {
        assert_eq!(RouteProfile::DrivingTraffic.as_str(), "driving-traffic");
        assert_eq!(RouteProfile::Walking.as_str(), "walking");
    }
}

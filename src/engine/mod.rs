//! Stateful navigation components.
//!
//! Each submodule owns one piece of session state and exposes plain
//! synchronous methods; the session aggregate in [`crate::session`] wires
//! them together. Timestamps are passed in explicitly (milliseconds), which
//! keeps every component deterministic under test.

pub mod bearing;
pub mod camera;
pub mod matcher;
pub mod progress;
pub mod recalc;
pub mod smoother;

pub use bearing::BearingEstimator;
pub use camera::{CameraController, CameraMode};
pub use progress::{ProgressTracker, ProgressUpdate};
pub use recalc::{RecalcOutcome, RecalcThrottle, RecalcTrigger, SkipReason};
pub use smoother::PositionSmoother;

use crate::provider::RouteProfile;
use crate::{NavError, Result};
use geo::Point;

/// One raw sample from the Position Source. Never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    /// WGS84 position (x = lng, y = lat).
    pub point: Point<f64>,
    /// Ground speed in m/s, when the sensor reports one.
    pub speed_mps: Option<f64>,
    /// Raw device heading in degrees, when the sensor reports one.
    pub heading_deg: Option<f64>,
    /// Sensor timestamp in milliseconds.
    pub timestamp_ms: u64,
}

impl PositionFix {
    pub fn new(lng: f64, lat: f64, timestamp_ms: u64) -> Self {
        Self {
            point: Point::new(lng, lat),
            speed_mps: None,
            heading_deg: None,
            timestamp_ms,
        }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_deg = Some(heading_deg);
        self
    }
}

/// Tunables for the navigation engine.
///
/// The defaults reproduce the behavior of the production overlay: 30 m snap
/// radius, 50 m deviation radius, 5 s progress/recalculation throttles, and
/// the follow camera at zoom 17 / pitch 60.
#[derive(Debug, Clone)]
pub struct NavConfig {
    /// Marker interpolation factor per animation tick, in `(0, 1]`.
    /// Smaller is smoother but converges more slowly.
    pub smoothing_alpha: f64,
    /// Snap-to-route radius in meters. Beyond it the raw GPS position is
    /// trusted, which avoids snapping to a parallel road.
    pub snap_threshold_m: f64,
    /// Matched distance beyond which the route is considered stale.
    pub deviation_threshold_m: f64,
    /// Minimum wall-clock gap between progress recomputations.
    pub progress_interval_ms: u64,
    /// Minimum wall-clock gap between deviation-triggered recalculations.
    pub recalc_interval_ms: u64,
    /// Speed at or below which the agent counts as stationary, in m/s.
    pub speed_threshold_mps: f64,
    /// Routing profile sent to the Directions Provider.
    pub profile: RouteProfile,

    /// Follow-camera zoom level.
    pub follow_zoom: f64,
    /// Follow-camera pitch in degrees.
    pub follow_pitch: f64,
    /// Follow-camera transition duration in milliseconds.
    pub follow_duration_ms: u64,
    /// Screen offset in pixels placing the agent in the lower third of the
    /// viewport.
    pub follow_offset_px: (f64, f64),
    /// Recenter transition duration in milliseconds.
    pub recenter_duration_ms: u64,
    /// Overview framing padding in pixels.
    pub fit_padding_px: f64,
    /// Overview framing zoom cap.
    pub fit_max_zoom: f64,
    /// Overview fallback zoom when no valid points exist.
    pub overview_fallback_zoom: f64,

    /// Animation tick period for the driver loop, in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: 0.2,
            snap_threshold_m: 30.0,
            deviation_threshold_m: 50.0,
            progress_interval_ms: 5000,
            recalc_interval_ms: 5000,
            speed_threshold_mps: 0.5,
            profile: RouteProfile::DrivingTraffic,
            follow_zoom: 17.0,
            follow_pitch: 60.0,
            follow_duration_ms: 1000,
            follow_offset_px: (50.0, 150.0),
            recenter_duration_ms: 500,
            fit_padding_px: 80.0,
            fit_max_zoom: 16.0,
            overview_fallback_zoom: 10.0,
            tick_interval_ms: 16,
        }
    }
}

impl NavConfig {
    /// Validate the invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(NavError::InvalidConfig(format!(
                "smoothing_alpha must be in (0, 1], got {}",
                self.smoothing_alpha
            )));
        }
        if self.snap_threshold_m <= 0.0 || !self.snap_threshold_m.is_finite() {
            return Err(NavError::InvalidConfig(format!(
                "snap_threshold_m must be positive, got {}",
                self.snap_threshold_m
            )));
        }
        if self.deviation_threshold_m <= 0.0 || !self.deviation_threshold_m.is_finite() {
            return Err(NavError::InvalidConfig(format!(
                "deviation_threshold_m must be positive, got {}",
                self.deviation_threshold_m
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(NavError::InvalidConfig(
                "tick_interval_ms must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        NavConfig::default().validate().unwrap();
    }

    #[test]
    fn alpha_bounds_are_enforced() {
        let mut config = NavConfig::default();
        config.smoothing_alpha = 0.0;
        assert!(config.validate().is_err());

        config.smoothing_alpha = 1.0;
        assert!(config.validate().is_ok());

        config.smoothing_alpha = 1.01;
        assert!(config.validate().is_err());
    }

    #[test]
    fn fix_builder_carries_optionals() {
        let fix = PositionFix::new(-46.63, -23.55, 1000)
            .with_speed(5.0)
            .with_heading(92.0);
        assert_eq!(fix.speed_mps, Some(5.0));
        assert_eq!(fix.heading_deg, Some(92.0));
        assert_eq!(fix.timestamp_ms, 1000);
    }
}

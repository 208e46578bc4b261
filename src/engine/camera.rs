//! Follow/free-look camera state machine.
//!
//! While `Following`, every position/bearing update re-emits a camera ease
//! toward the agent's raw position. Any user drag or zoom gesture drops to
//! `FreeLook`, which stays silent until a recenter command completes.

use crate::engine::NavConfig;
use crate::geometry;
use crate::render::CameraEase;
use geo::Point;

/// Camera follow mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Continuously re-centers on the agent.
    Following,
    /// The user repositioned the view manually.
    FreeLook,
}

/// How an overview command frames the map.
#[derive(Debug, Clone, PartialEq)]
pub enum OverviewFraming {
    /// Frame the bounding box of these points (padding, capped zoom).
    Fit(Vec<Point<f64>>),
    /// No valid points: jump to a default center at a low zoom.
    Fallback(Point<f64>),
}

/// Drives camera intents from position/bearing updates and user commands.
#[derive(Debug, Clone)]
pub struct CameraController {
    mode: CameraMode,
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            mode: CameraMode::Following,
        }
    }

    #[inline]
    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// A user drag or zoom gesture releases the camera.
    pub fn on_user_gesture(&mut self) {
        self.mode = CameraMode::FreeLook;
    }

    /// Camera ease for a position/bearing update, emitted only while
    /// following. Centers on the raw, unsmoothed position.
    pub fn follow(&self, raw: Point<f64>, bearing_deg: f64, config: &NavConfig) -> Option<CameraEase> {
        (self.mode == CameraMode::Following).then(|| CameraEase {
            center: raw,
            bearing_deg,
            zoom: config.follow_zoom,
            pitch_deg: config.follow_pitch,
            duration_ms: config.follow_duration_ms,
            offset_px: config.follow_offset_px,
        })
    }

    /// First phase of a recenter: ease toward the last known position at the
    /// stable bearing. The mode flips to `Following` only when
    /// [`CameraController::complete_recenter`] fires after the transition.
    ///
    /// Returns `None` when no position is known yet.
    pub fn begin_recenter(
        &self,
        last_position: Option<Point<f64>>,
        stable_bearing_deg: f64,
        config: &NavConfig,
    ) -> Option<CameraEase> {
        let center = last_position?;
        Some(CameraEase {
            center,
            bearing_deg: stable_bearing_deg,
            zoom: config.follow_zoom,
            pitch_deg: config.follow_pitch,
            duration_ms: config.recenter_duration_ms,
            offset_px: config.follow_offset_px,
        })
    }

    /// Second phase of a recenter, after the camera transition completed.
    pub fn complete_recenter(&mut self) {
        self.mode = CameraMode::Following;
    }

    /// The overview command: force free-look and frame origin plus all
    /// destinations, or fall back to a default center at a low zoom when no
    /// valid points exist.
    pub fn overview(
        &mut self,
        origin: Option<Point<f64>>,
        destinations: &[Point<f64>],
    ) -> OverviewFraming {
        self.mode = CameraMode::FreeLook;

        let mut points: Vec<Point<f64>> = Vec::with_capacity(destinations.len() + 1);
        points.extend(origin.filter(|p| geometry::is_finite(*p)));
        points.extend(destinations.iter().copied().filter(|p| geometry::is_finite(*p)));

        if points.is_empty() {
            let center = origin
                .filter(|p| geometry::is_finite(*p))
                .unwrap_or_else(|| Point::new(0.0, 0.0));
            OverviewFraming::Fallback(center)
        } else {
            OverviewFraming::Fit(points)
        }
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

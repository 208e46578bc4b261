//! Navigation session state and lifecycle.
//!
//! [`NavigationSession`] folds all mutable navigation state (route geometry,
//! smoothed marker, stable bearing, throttles, camera mode) into one struct
//! with explicit methods; there is no ambient state. The synchronous core
//! lives here, the async loop that owns it lives in [`driver`].

pub mod driver;

use crate::engine::{
    BearingEstimator, CameraController, CameraMode, NavConfig, PositionFix, PositionSmoother,
    ProgressTracker, RecalcOutcome, RecalcThrottle, RecalcTrigger, camera::OverviewFraming,
    matcher,
};
use crate::provider::RouteProfile;
use crate::render::{MapRenderer, RouteLayers};
use crate::route::RouteGeometry;
use crate::{NavError, Result};
use geo::Point;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Outward session events for the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new route geometry replaced the previous one.
    RouteUpdated,
    /// A deviation triggered a route recalculation.
    DeviationRecalculating,
}

/// A route fetch the driver should dispatch to the Directions Provider.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub waypoints: Vec<Point<f64>>,
    pub profile: RouteProfile,
}

/// Aggregates all navigation state for one tracking session.
///
/// Single-writer by construction: exactly one owner (normally the driver
/// task) calls these methods, and each field is written from exactly one of
/// them.
pub struct NavigationSession<R: MapRenderer> {
    config: NavConfig,
    renderer: R,

    origin: Option<Point<f64>>,
    destinations: Vec<Point<f64>>,
    route: Option<RouteGeometry>,

    smoother: PositionSmoother,
    bearing: BearingEstimator,
    progress: ProgressTracker,
    recalc: RecalcThrottle,
    camera: CameraController,

    last_fix_point: Option<Point<f64>>,
    /// Gray layer from the last progress split, redrawn when a recalculated
    /// route lands so the traveled part does not flash away.
    last_traveled: Option<Vec<Point<f64>>>,

    events: Option<UnboundedSender<SessionEvent>>,
}

impl<R: MapRenderer> NavigationSession<R> {
    pub fn new(config: NavConfig, renderer: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            smoother: PositionSmoother::new(config.smoothing_alpha),
            bearing: BearingEstimator::new(config.speed_threshold_mps),
            progress: ProgressTracker::new(config.progress_interval_ms, config.deviation_threshold_m),
            recalc: RecalcThrottle::new(config.recalc_interval_ms),
            camera: CameraController::new(),
            origin: None,
            destinations: Vec::new(),
            route: None,
            last_fix_point: None,
            last_traveled: None,
            events: None,
            config,
            renderer,
        })
    }

    /// Deliver [`SessionEvent`]s to the host through this channel.
    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Set or replace the waypoint identity.
    ///
    /// Returns a fetch request when the identity actually changed (the dedup
    /// key gate skips everything else, so position updates alone never
    /// re-trigger a full route fetch).
    pub fn set_waypoints(
        &mut self,
        origin: Point<f64>,
        destinations: Vec<Point<f64>>,
        now_ms: u64,
    ) -> Option<FetchRequest> {
        self.origin = Some(origin);
        self.destinations = destinations;

        match self.recalc.request(
            self.origin,
            &self.destinations,
            origin,
            RecalcTrigger::WaypointsChanged,
            now_ms,
        ) {
            RecalcOutcome::Dispatched { waypoints } => Some(FetchRequest {
                waypoints,
                profile: self.config.profile,
            }),
            RecalcOutcome::Skipped(_) => None,
        }
    }

    /// Process one position fix to completion.
    ///
    /// Returns a fetch request when this fix triggered a deviation
    /// recalculation.
    pub fn on_fix(&mut self, fix: PositionFix, now_ms: u64) -> Option<FetchRequest> {
        let raw = fix.point;
        if !crate::geometry::is_finite(raw) {
            let err = NavError::InvalidFix {
                lng: raw.x(),
                lat: raw.y(),
            };
            warn!(%err, "dropping invalid fix");
            return None;
        }

        self.last_fix_point = Some(raw);

        // Snap-to-route decides the marker target; the camera keeps
        // following the raw position.
        let matched = matcher::match_target(raw, self.route.as_ref(), self.config.snap_threshold_m);
        self.smoother.set_target(matched.target);

        let bearing_deg = self.bearing.update(
            fix.speed_mps,
            fix.heading_deg,
            matched.result.as_ref(),
            self.route.as_ref(),
        );

        if let Some(ease) = self.camera.follow(raw, bearing_deg, &self.config) {
            self.renderer.animate_camera(ease);
        }

        let update = self.progress.update(now_ms, raw, self.route.as_ref())?;
        self.last_traveled = Some(update.progress.traveled.clone());
        self.renderer.set_route_layers(RouteLayers {
            traveled: Some(update.progress.traveled),
            remaining: Some(update.progress.remaining),
        });

        if !update.deviated {
            return None;
        }

        match self.recalc.request(
            self.origin,
            &self.destinations,
            raw,
            RecalcTrigger::Deviation,
            now_ms,
        ) {
            RecalcOutcome::Dispatched { waypoints } => {
                info!(
                    distance_m = format_args!("{:.0}", update.distance_m),
                    "off route, recalculating"
                );
                self.emit(SessionEvent::DeviationRecalculating);
                Some(FetchRequest {
                    waypoints,
                    profile: self.config.profile,
                })
            }
            RecalcOutcome::Skipped(_) => None,
        }
    }

    /// One animation tick: advance the smoothed marker. Never blocks.
    pub fn on_tick(&mut self) {
        if let Some(current) = self.smoother.tick() {
            self.renderer.move_marker(current);
        }
    }

    /// User started dragging the map.
    pub fn on_user_drag(&mut self) {
        self.camera.on_user_gesture();
    }

    /// User started a zoom gesture.
    pub fn on_user_zoom(&mut self) {
        self.camera.on_user_gesture();
    }

    /// Begin a recenter: ease toward the last known position.
    ///
    /// Returns the transition duration; the caller must invoke
    /// [`NavigationSession::complete_recenter`] once that long has elapsed.
    /// Returns `None` when no fix has arrived yet.
    pub fn recenter(&mut self) -> Option<u64> {
        let ease = self.camera.begin_recenter(
            self.last_fix_point,
            self.bearing.stable_deg(),
            &self.config,
        )?;
        let duration = ease.duration_ms;
        self.renderer.animate_camera(ease);
        Some(duration)
    }

    /// Second phase of a recenter, after the camera transition completed:
    /// resume following and arm the north-up rule for stationary fixes.
    pub fn complete_recenter(&mut self) {
        self.camera.complete_recenter();
        self.bearing.set_recenter_pending();
    }

    /// The overview command: frame origin and destinations (or the default
    /// view), forcing free-look.
    pub fn overview(&mut self) {
        match self.camera.overview(self.origin, &self.destinations) {
            OverviewFraming::Fit(points) => self.renderer.fit_bounds(
                &points,
                self.config.fit_padding_px,
                self.config.fit_max_zoom,
            ),
            OverviewFraming::Fallback(center) => self
                .renderer
                .fly_to(center, self.config.overview_fallback_zoom),
        }
    }

    /// Apply the outcome of a dispatched route fetch.
    ///
    /// Success replaces the geometry atomically and redraws the layers;
    /// failure (or no route) retains the previous geometry, clearing the
    /// layers only when none existed. Returns a follow-up fetch request when
    /// a waypoint change was queued behind the resolved one.
    pub fn apply_route_result(
        &mut self,
        result: Result<RouteGeometry>,
        now_ms: u64,
    ) -> Option<FetchRequest> {
        let queued = self.recalc.complete(now_ms);

        match result {
            Ok(geometry) => {
                debug!(vertices = geometry.points().len(), "route geometry replaced");
                let remaining = geometry.points().to_vec();
                self.route = Some(geometry);
                self.progress.reset();

                // Keep the gray traveled layer from before the recalculation;
                // the next progress pass replaces it with a fresh split.
                let traveled = self
                    .last_traveled
                    .clone()
                    .filter(|coords| coords.len() > 1);
                self.renderer.set_route_layers(RouteLayers {
                    traveled,
                    remaining: Some(remaining),
                });
                self.emit(SessionEvent::RouteUpdated);
            }
            Err(err) => {
                warn!(%err, "route fetch failed, keeping previous geometry");
                if self.route.is_none() {
                    self.renderer.set_route_layers(RouteLayers::empty());
                }
            }
        }

        queued.map(|waypoints| FetchRequest {
            waypoints,
            profile: self.config.profile,
        })
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            // The host may have dropped its receiver; that only means nobody
            // is listening.
            let _ = events.send(event);
        }
    }

    // === Accessors ===

    #[inline]
    pub fn camera_mode(&self) -> CameraMode {
        self.camera.mode()
    }

    #[inline]
    pub fn route(&self) -> Option<&RouteGeometry> {
        self.route.as_ref()
    }

    #[inline]
    pub fn stable_bearing_deg(&self) -> f64 {
        self.bearing.stable_deg()
    }

    #[inline]
    pub fn marker_position(&self) -> Option<Point<f64>> {
        self.smoother.current()
    }

    #[inline]
    pub fn marker_target(&self) -> Option<Point<f64>> {
        self.smoother.target()
    }

    #[inline]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    #[inline]
    pub fn config(&self) -> &NavConfig {
        &self.config
    }
}

//! Async ownership of a navigation session.
//!
//! One task owns the [`NavigationSession`] and multiplexes everything onto
//! it: the animation tick, the fix stream, host commands, resolved route
//! fetches and recenter-transition timers. Route fetches are the only true
//! asynchronous wait and run as spawned tasks; the session keeps processing
//! fixes against the previous geometry while one is in flight.

use crate::engine::PositionFix;
use crate::provider::DirectionsProvider;
use crate::render::MapRenderer;
use crate::route::RouteGeometry;
use crate::session::{FetchRequest, NavigationSession};
use geo::Point;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::debug;

/// Commands from the host UI and map gesture events.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Replace the waypoint identity (may trigger a route fetch).
    SetWaypoints {
        origin: Point<f64>,
        destinations: Vec<Point<f64>>,
    },
    /// The user started dragging the map.
    UserDrag,
    /// The user started a zoom gesture.
    UserZoom,
    /// Recenter on the agent and resume following.
    Recenter,
    /// Frame origin and destinations, releasing the camera.
    Overview,
    /// Stop the session. The tick stops and an in-flight fetch is discarded.
    Stop,
}

/// Cloneable handle for feeding a running session.
///
/// Dropping every clone ends the session, like unsubscribing from the
/// position source.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    fixes: UnboundedSender<PositionFix>,
    commands: UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Push one position fix. Returns false once the session has stopped.
    pub fn send_fix(&self, fix: PositionFix) -> bool {
        self.fixes.send(fix).is_ok()
    }

    /// Send a command. Returns false once the session has stopped.
    pub fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn stop(&self) {
        let _ = self.commands.send(SessionCommand::Stop);
    }
}

/// Receiver ends owned by [`run`].
pub struct SessionStreams {
    fixes: UnboundedReceiver<PositionFix>,
    commands: UnboundedReceiver<SessionCommand>,
}

/// Create the handle/stream pair connecting a host to [`run`].
pub fn channel() -> (SessionHandle, SessionStreams) {
    let (fix_tx, fix_rx) = mpsc::unbounded_channel();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    (
        SessionHandle {
            fixes: fix_tx,
            commands: cmd_tx,
        },
        SessionStreams {
            fixes: fix_rx,
            commands: cmd_rx,
        },
    )
}

enum TimerEvent {
    RecenterDone,
}

/// Drive a session until it stops, then hand it back for inspection.
///
/// The loop never blocks the animation tick on I/O: provider calls run as
/// spawned tasks and their results come back through a channel. A fetch
/// still in flight when the loop exits completes in the background and its
/// result is discarded.
pub async fn run<R, P>(
    mut session: NavigationSession<R>,
    provider: Arc<P>,
    mut streams: SessionStreams,
) -> NavigationSession<R>
where
    R: MapRenderer,
    P: DirectionsProvider,
{
    let started = Instant::now();
    let now_ms = || started.elapsed().as_millis() as u64;

    let mut tick = tokio::time::interval(Duration::from_millis(session.config().tick_interval_ms));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let (fetch_tx, mut fetch_rx) = mpsc::unbounded_channel::<crate::Result<RouteGeometry>>();
    let (timer_tx, mut timer_rx) = mpsc::unbounded_channel::<TimerEvent>();

    let dispatch = |request: FetchRequest| {
        let provider = Arc::clone(&provider);
        let fetch_tx = fetch_tx.clone();
        tokio::spawn(async move {
            let result = provider.fetch_route(request.waypoints, request.profile).await;
            // The session may have stopped meanwhile; the result is then
            // simply discarded.
            let _ = fetch_tx.send(result);
        });
    };

    loop {
        tokio::select! {
            _ = tick.tick() => session.on_tick(),

            fix = streams.fixes.recv() => match fix {
                Some(fix) => {
                    if let Some(request) = session.on_fix(fix, now_ms()) {
                        dispatch(request);
                    }
                }
                // Position source detached: the session is over.
                None => break,
            },

            command = streams.commands.recv() => match command {
                Some(SessionCommand::SetWaypoints { origin, destinations }) => {
                    if let Some(request) = session.set_waypoints(origin, destinations, now_ms()) {
                        dispatch(request);
                    }
                }
                Some(SessionCommand::UserDrag) => session.on_user_drag(),
                Some(SessionCommand::UserZoom) => session.on_user_zoom(),
                Some(SessionCommand::Recenter) => {
                    if let Some(duration_ms) = session.recenter() {
                        let timer_tx = timer_tx.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
                            let _ = timer_tx.send(TimerEvent::RecenterDone);
                        });
                    }
                }
                Some(SessionCommand::Overview) => session.overview(),
                Some(SessionCommand::Stop) | None => break,
            },

            Some(result) = fetch_rx.recv() => {
                if let Some(request) = session.apply_route_result(result, now_ms()) {
                    dispatch(request);
                }
            }

            Some(TimerEvent::RecenterDone) = timer_rx.recv() => session.complete_recenter(),
        }
    }

    debug!("session stopped");
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CameraMode, NavConfig};
    use crate::provider::RouteProfile;
    use crate::render::testing::RecordingRenderer;
    use crate::{NavError, Result};

    struct StraightLineProvider;

    impl DirectionsProvider for StraightLineProvider {
        async fn fetch_route(
            &self,
            waypoints: Vec<Point<f64>>,
            _profile: RouteProfile,
        ) -> Result<RouteGeometry> {
            RouteGeometry::new(waypoints)
        }
    }

    /// Resolves long after any test timeline of interest.
    struct SlowProvider;

    impl DirectionsProvider for SlowProvider {
        async fn fetch_route(
            &self,
            waypoints: Vec<Point<f64>>,
            _profile: RouteProfile,
        ) -> Result<RouteGeometry> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            RouteGeometry::new(waypoints)
        }
    }

    struct FailingProvider;

    impl DirectionsProvider for FailingProvider {
        async fn fetch_route(
            &self,
            _waypoints: Vec<Point<f64>>,
            _profile: RouteProfile,
        ) -> Result<RouteGeometry> {
            Err(NavError::NoRoute)
        }
    }

    fn session() -> NavigationSession<RecordingRenderer> {
        NavigationSession::new(NavConfig::default(), RecordingRenderer::new()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_a_route_and_follows_fixes() {
        let (handle, streams) = channel();
        let task = tokio::spawn(run(session(), Arc::new(StraightLineProvider), streams));

        handle.send(SessionCommand::SetWaypoints {
            origin: Point::new(0.0, 0.0),
            destinations: vec![Point::new(0.01, 0.0)],
        });
        // Let the fetch resolve, then walk along the route.
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.send_fix(PositionFix::new(0.001, 0.0, 100).with_speed(5.0));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop();

        let session = task.await.unwrap();
        assert!(session.route().is_some());
        // Ticks ran while we slept, so the marker moved.
        assert!(!session.renderer().markers().is_empty());
        // The moving fix produced a follow ease along the eastbound route.
        let ease = *session.renderer().eases().last().unwrap();
        assert_eq!(ease.center, Point::new(0.001, 0.0));
        assert!((ease.bearing_deg - 90.0).abs() < 0.2);
    }

    #[tokio::test(start_paused = true)]
    async fn waypoint_change_survives_a_slow_fetch() {
        let (handle, streams) = channel();
        let task = tokio::spawn(run(session(), Arc::new(SlowProvider), streams));

        handle.send(SessionCommand::SetWaypoints {
            origin: Point::new(0.0, 0.0),
            destinations: vec![Point::new(0.01, 0.0)],
        });
        // Change destination while the first fetch is still sleeping.
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.send(SessionCommand::SetWaypoints {
            origin: Point::new(0.0, 0.0),
            destinations: vec![Point::new(0.02, 0.0)],
        });

        // First fetch resolves at ~10 s, the queued one at ~20 s.
        tokio::time::sleep(Duration::from_secs(25)).await;
        handle.stop();

        let session = task.await.unwrap();
        let route = session.route().expect("queued fetch resolved");
        assert_eq!(route.points().last(), Some(&Point::new(0.02, 0.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_leaves_no_route() {
        let (handle, streams) = channel();
        let task = tokio::spawn(run(session(), Arc::new(FailingProvider), streams));

        handle.send(SessionCommand::SetWaypoints {
            origin: Point::new(0.0, 0.0),
            destinations: vec![Point::new(0.01, 0.0)],
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop();

        let session = task.await.unwrap();
        assert!(session.route().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_resolving_after_stop_is_discarded() {
        let (handle, streams) = channel();
        let task = tokio::spawn(run(session(), Arc::new(SlowProvider), streams));

        handle.send(SessionCommand::SetWaypoints {
            origin: Point::new(0.0, 0.0),
            destinations: vec![Point::new(0.01, 0.0)],
        });
        // Stop while the fetch is still sleeping.
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop();

        let session = task.await.unwrap();
        assert!(session.route().is_none());

        // Let the provider finish; its result has nowhere to land.
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(session.route().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn recenter_completes_after_the_transition() {
        let (handle, streams) = channel();
        let task = tokio::spawn(run(session(), Arc::new(StraightLineProvider), streams));

        handle.send_fix(PositionFix::new(0.0, 0.0, 0));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.send(SessionCommand::UserDrag);
        handle.send(SessionCommand::Recenter);

        // Longer than the 500 ms transition: the completion timer fires.
        tokio::time::sleep(Duration::from_millis(700)).await;
        handle.stop();

        let session = task.await.unwrap();
        assert_eq!(session.camera_mode(), CameraMode::Following);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_session() {
        let (handle, streams) = channel();
        let task = tokio::spawn(run(session(), Arc::new(StraightLineProvider), streams));

        handle.send_fix(PositionFix::new(0.0, 0.0, 0));
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(handle);

        let session = task.await.unwrap();
        assert!(session.marker_position().is_some());
    }
}

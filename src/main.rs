//! Demo driver: runs a simulated navigation session against a straight-line
//! directions stub and logs every renderer intent.

use clap::Parser;
use geo::Point;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, info};
use turn_nav::session::driver::{self, SessionCommand};
use turn_nav::{
    CameraEase, DirectionsProvider, MapRenderer, NavConfig, NavigationSession, PositionFix,
    RouteGeometry, RouteLayers, RouteProfile,
};

/// Turn Nav - simulated turn-by-turn navigation session
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Settings {
    /// Origin as "lng,lat"
    #[clap(long, value_parser = parse_point, default_value = "-46.63,-23.55")]
    origin: Point<f64>,

    /// Destination as "lng,lat" (repeatable)
    #[clap(long = "dest", value_parser = parse_point, default_value = "-46.62,-23.55")]
    destinations: Vec<Point<f64>>,

    /// Number of simulated fixes
    #[clap(long, default_value_t = 30)]
    steps: u32,

    /// Simulated fix period in milliseconds
    #[clap(long, default_value_t = 250)]
    fix_interval_ms: u64,
}

fn parse_point(s: &str) -> Result<Point<f64>, String> {
    let (lng, lat) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lng,lat\", got {s:?}"))?;
    let lng: f64 = lng.trim().parse().map_err(|e| format!("bad longitude: {e}"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {e}"))?;
    Ok(Point::new(lng, lat))
}

/// Directions stub: the route is the waypoint polyline itself.
struct StraightLineDirections;

impl DirectionsProvider for StraightLineDirections {
    async fn fetch_route(
        &self,
        waypoints: Vec<Point<f64>>,
        profile: RouteProfile,
    ) -> turn_nav::Result<RouteGeometry> {
        info!(profile = profile.as_str(), waypoints = waypoints.len(), "fetching route");
        RouteGeometry::new(waypoints)
    }
}

/// Renderer that logs intents instead of drawing.
struct LogRenderer;

impl MapRenderer for LogRenderer {
    fn set_route_layers(&mut self, layers: RouteLayers) {
        info!(
            traveled = layers.traveled.as_ref().map_or(0, Vec::len),
            remaining = layers.remaining.as_ref().map_or(0, Vec::len),
            "route layers replaced"
        );
    }

    fn move_marker(&mut self, point: Point<f64>) {
        debug!(lng = point.x(), lat = point.y(), "marker moved");
    }

    fn animate_camera(&mut self, ease: CameraEase) {
        info!(
            lng = ease.center.x(),
            lat = ease.center.y(),
            bearing = format_args!("{:.1}", ease.bearing_deg),
            zoom = ease.zoom,
            "camera ease"
        );
    }

    fn fit_bounds(&mut self, points: &[Point<f64>], padding_px: f64, max_zoom: f64) {
        info!(points = points.len(), padding_px, max_zoom, "fit bounds");
    }

    fn fly_to(&mut self, center: Point<f64>, zoom: f64) {
        info!(lng = center.x(), lat = center.y(), zoom, "fly to");
    }
}

#[tokio::main]
async fn main() -> turn_nav::Result<()> {
    tracing_subscriber::fmt::init();
    let settings = Settings::parse();

    let session = NavigationSession::new(NavConfig::default(), LogRenderer)?;
    let (handle, streams) = driver::channel();
    let task = tokio::spawn(driver::run(
        session,
        Arc::new(StraightLineDirections),
        streams,
    ));

    handle.send(SessionCommand::SetWaypoints {
        origin: settings.origin,
        destinations: settings.destinations.clone(),
    });

    // Walk from the origin toward the first destination at a constant pace.
    let destination = settings.destinations[0];
    let steps = settings.steps.max(1);
    for step in 0..=steps {
        let t = f64::from(step) / f64::from(steps);
        let fix = PositionFix::new(
            settings.origin.x() + (destination.x() - settings.origin.x()) * t,
            settings.origin.y() + (destination.y() - settings.origin.y()) * t,
            u64::from(step) * settings.fix_interval_ms,
        )
        .with_speed(8.0);
        handle.send_fix(fix);
        tokio::time::sleep(Duration::from_millis(settings.fix_interval_ms)).await;
    }

    handle.send(SessionCommand::Overview);
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.stop();
    task.await.expect("session task panicked");

    Ok(())
}

//! The Map Renderer boundary.
//!
//! The engine never draws; it emits intents through [`MapRenderer`] and the
//! host's map widget executes them. Camera intents are fire-and-forget
//! animated transitions: a newly emitted intent fully supersedes any prior
//! in-flight transition, so no cancellation API exists.

use geo::Point;

/// An animated camera transition toward a fixed view.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraEase {
    /// View center (raw agent position while following).
    pub center: Point<f64>,
    /// Map bearing in degrees, `[0, 360)`.
    pub bearing_deg: f64,
    pub zoom: f64,
    pub pitch_deg: f64,
    pub duration_ms: u64,
    /// Screen offset in pixels; places the agent in the lower third of the
    /// viewport while following.
    pub offset_px: (f64, f64),
}

/// Traveled/remaining route layers, replacing whatever was shown before.
///
/// Both layers live under one renderer source: publishing replaces the
/// source's content, it never appends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteLayers {
    /// Already-driven part, styled gray.
    pub traveled: Option<Vec<Point<f64>>>,
    /// Part still ahead, styled blue.
    pub remaining: Option<Vec<Point<f64>>>,
}

impl RouteLayers {
    /// Layers clearing the route source entirely.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Intents consumed by the host map widget.
pub trait MapRenderer {
    /// Replace the route source with these layers.
    fn set_route_layers(&mut self, layers: RouteLayers);

    /// Move the agent marker to the smoothed position.
    fn move_marker(&mut self, point: Point<f64>);

    /// Animate the camera toward a view. Supersedes any in-flight transition.
    fn animate_camera(&mut self, ease: CameraEase);

    /// Frame a set of points with padding, capped at `max_zoom`.
    fn fit_bounds(&mut self, points: &[Point<f64>], padding_px: f64, max_zoom: f64);

    /// Jump to a plain center/zoom view (overview fallback when no valid
    /// points exist).
    fn fly_to(&mut self, center: Point<f64>, zoom: f64);
}

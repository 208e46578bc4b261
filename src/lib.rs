//! Turn Nav - Navigation State Engine for Live Turn-by-turn Overlays
//!
//! This library turns a stream of noisy, irregularly-timed position fixes
//! into a smoothly animated marker, a stable heading, a traveled/remaining
//! route split, a follow-vs-free camera mode, and a rate-limited decision to
//! request a new route.
//!
//! # Architecture
//!
//! - **[`geometry`]**: pure polyline math (distance, bearing, nearest point)
//! - **[`route`]**: validated route polylines and progress splitting
//! - **[`engine`]**: the stateful components (smoother, matcher, bearing
//!   estimator, progress tracker, recalculation throttle, camera controller)
//! - **[`provider`]**: the Directions Provider boundary
//! - **[`render`]**: the Map Renderer boundary (camera intents, route layers)
//! - **[`session`]**: the [`session::NavigationSession`] aggregate and the
//!   async driver loop that owns it
//!
//! # Concurrency model
//!
//! The session core is a plain synchronous struct owned by exactly one driver
//! task. The animation tick, the fix stream and session commands are
//! multiplexed onto it with `tokio::select!`; route fetches are the only true
//! asynchronous wait and run as spawned tasks whose results land back in the
//! driver. No field has more than one writer.

pub mod engine;
pub mod geometry;
pub mod provider;
pub mod render;
pub mod route;
pub mod session;

// Public API exports
pub use engine::{NavConfig, PositionFix};
pub use geometry::MatchResult;
pub use provider::{DirectionsProvider, RouteProfile};
pub use render::{CameraEase, MapRenderer, RouteLayers};
pub use route::RouteGeometry;
pub use session::{NavigationSession, SessionEvent};

/// Error types for the navigation engine
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("invalid fix: non-finite coordinates ({lng}, {lat})")]
    InvalidFix { lng: f64, lat: f64 },

    #[error("degenerate line: need at least 2 points, got {0}")]
    DegenerateLine(usize),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("empty route")]
    EmptyRoute,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("directions provider error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("no route found for the given waypoints")]
    NoRoute,
}

pub type Result<T> = std::result::Result<T, NavError>;

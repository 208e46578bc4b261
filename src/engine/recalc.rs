//! Route recalculation gating.
//!
//! Two distinct triggers want a fresh route: the waypoint identity changed
//! (new origin/destination set), or the agent deviated from the active
//! route. Identity changes are deduplicated by key, so position updates
//! alone can never re-trigger a fetch; deviations are for the *same* key and
//! are gated purely by time.

use geo::Point;
use tracing::debug;

/// Why a recalculation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecalcTrigger {
    /// Origin or destination set changed identity. Key-gated.
    WaypointsChanged,
    /// Matched distance exceeded the deviation radius. Time-gated only.
    Deviation,
}

/// Why a request was not dispatched. Normal control flow, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No origin, or an empty destination set.
    MissingInputs,
    /// Same `(origin, destinations)` key as the last dispatched request.
    NoChange,
    /// Deviation fired inside the throttle window.
    Throttled,
    /// A previous request has not resolved yet.
    InFlight,
}

/// Outcome of [`RecalcThrottle::request`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecalcOutcome {
    /// Fetch a route for these waypoints (start first, then destinations in
    /// caller order).
    Dispatched { waypoints: Vec<Point<f64>> },
    Skipped(SkipReason),
}

/// An identity change that arrived while a request was in flight, waiting
/// for that request to resolve.
#[derive(Debug, Clone)]
struct PendingRequest {
    key: String,
    waypoints: Vec<Point<f64>>,
}

/// Decides when a new route fetch is warranted and deduplicates requests.
///
/// At most one request is in flight at any time; the dispatch timestamp is
/// recorded before the provider call resolves. An identity change arriving
/// while a request is in flight is queued (latest wins) and dispatched by
/// [`RecalcThrottle::complete`], never dropped.
#[derive(Debug, Clone)]
pub struct RecalcThrottle {
    interval_ms: u64,
    last_dispatched_key: Option<String>,
    last_recalc_at_ms: Option<u64>,
    in_flight: bool,
    pending: Option<PendingRequest>,
}

impl RecalcThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_dispatched_key: None,
            last_recalc_at_ms: None,
            in_flight: false,
            pending: None,
        }
    }

    /// Apply the gating rules for one recalculation request.
    ///
    /// `start` is the first waypoint of the fetch: the origin for identity
    /// changes, the live agent position for deviations. The dedup key always
    /// covers the waypoint identity `(origin, destinations)`, never the live
    /// position.
    pub fn request(
        &mut self,
        origin: Option<Point<f64>>,
        destinations: &[Point<f64>],
        start: Point<f64>,
        trigger: RecalcTrigger,
        now_ms: u64,
    ) -> RecalcOutcome {
        let Some(origin) = origin else {
            return self.skip(SkipReason::MissingInputs, trigger);
        };
        if destinations.is_empty() {
            return self.skip(SkipReason::MissingInputs, trigger);
        }

        let key = dedup_key(origin, destinations);

        match trigger {
            RecalcTrigger::WaypointsChanged => {
                if self.last_dispatched_key.as_deref() == Some(key.as_str()) {
                    // Reverting to the dispatched identity retires any
                    // queued change.
                    self.pending = None;
                    return self.skip(SkipReason::NoChange, trigger);
                }
            }
            RecalcTrigger::Deviation => {
                if let Some(last) = self.last_recalc_at_ms {
                    if now_ms.saturating_sub(last) < self.interval_ms {
                        return self.skip(SkipReason::Throttled, trigger);
                    }
                }
            }
        }

        if self.in_flight {
            // An identity change must not be lost: queue it for dispatch
            // when the in-flight request resolves. Deviations recur on
            // their own and are simply dropped.
            if trigger == RecalcTrigger::WaypointsChanged {
                self.pending = Some(PendingRequest {
                    key,
                    waypoints: waypoints_from(start, destinations),
                });
            }
            return self.skip(SkipReason::InFlight, trigger);
        }

        // Record before the provider call resolves so a slow provider can
        // never be asked twice.
        self.last_recalc_at_ms = Some(now_ms);
        self.in_flight = true;
        if trigger == RecalcTrigger::WaypointsChanged {
            self.last_dispatched_key = Some(key);
        }

        RecalcOutcome::Dispatched {
            waypoints: waypoints_from(start, destinations),
        }
    }

    /// Mark the in-flight request as resolved (success or failure).
    ///
    /// Returns the waypoints of a queued identity change, which the caller
    /// must dispatch; the throttle counts that dispatch as in flight again.
    pub fn complete(&mut self, now_ms: u64) -> Option<Vec<Point<f64>>> {
        self.in_flight = false;
        let pending = self.pending.take()?;

        debug!("dispatching queued identity change");
        self.in_flight = true;
        self.last_recalc_at_ms = Some(now_ms);
        self.last_dispatched_key = Some(pending.key);
        Some(pending.waypoints)
    }

    #[inline]
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    fn skip(&self, reason: SkipReason, trigger: RecalcTrigger) -> RecalcOutcome {
        debug!(?trigger, ?reason, "recalculation skipped");
        RecalcOutcome::Skipped(reason)
    }
}

/// Fetch waypoints: the start point followed by the destinations in order.
fn waypoints_from(start: Point<f64>, destinations: &[Point<f64>]) -> Vec<Point<f64>> {
    let mut waypoints = Vec::with_capacity(destinations.len() + 1);
    waypoints.push(start);
    waypoints.extend_from_slice(destinations);
    waypoints
}

/// Normalized serialization of the waypoint identity.
fn dedup_key(origin: Point<f64>, destinations: &[Point<f64>]) -> String {
    // geo's Point serializes deterministically; a serialization failure is
    // impossible for plain floats but degrades to an empty key rather than
    // panicking.
    serde_json::to_string(&(origin, destinations)).unwrap_or_default()
}

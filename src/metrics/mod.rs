pub mod aggregator;
pub mod cache_stats;
pub mod recorder;
pub mod snapshot;
pub mod status;
pub mod workers;

pub use aggregator::WindowMetrics;
pub use recorder::SampleRecorder;
pub use snapshot::{PerformanceSnapshot, SnapshotComposer};
pub use status::HealthStatus;
pub use workers::{WorkerCollector, WorkerSnapshot};

use chrono::{DateTime, Utc};

/// A single timing observation for one completed request.
/// This is the "write" side — the timing middleware creates these and
/// pushes them into the recorder. Immutable once recorded.
#[derive(Debug, Clone)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    /// Route template, e.g. "/api/videos/:id"
    pub route: String,
    /// Upper-cased HTTP method
    pub method: String,
    pub status_code: u16,
    /// Wall-clock handler latency in milliseconds
    pub latency_ms: f64,
}

/// Identity of one measured route. Every `(route, method)` pair owns its
/// own bounded history; the derived ordering (route, then method) keeps
/// per-route listings stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey {
    pub route: String,
    pub method: String,
}

impl RouteKey {
    pub fn new(route: &str, method: &str) -> Self {
        Self {
            route: route.to_owned(),
            method: method.to_uppercase(),
        }
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.route)
    }
}

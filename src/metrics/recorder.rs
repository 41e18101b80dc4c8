use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use super::{RouteKey, Sample};

// ─── Configuration ───────────────────────────────────────────────

/// Oldest span of history any window query may ask for (seconds).
pub const MAX_WINDOW_SECONDS: i64 = 3_600;

/// Ring capacity for each `(route, method)` history.
pub const MAX_SAMPLES_PER_ROUTE: usize = 500;

/// Ring capacity for the global history spanning all routes.
pub const MAX_SAMPLES_GLOBAL: usize = 5_000;

// ─── Recorder ────────────────────────────────────────────────────

/// Thread-safe sample store. The timing middleware calls `record()`
/// once per completed request; the snapshot composer reads copies.
///
/// Each route history sits behind its own mutex so appends on
/// unrelated routes never contend. Recording is fail-open: malformed
/// input is counted and dropped, never raised back to the request path.
pub struct SampleRecorder {
    routes: DashMap<RouteKey, Mutex<VecDeque<Sample>>>,
    global: Mutex<VecDeque<Sample>>,
    route_capacity: usize,
    global_capacity: usize,
    recorded: AtomicU64,
    dropped: AtomicU64,
}

impl SampleRecorder {
    pub fn new() -> Self {
        Self::with_capacities(MAX_SAMPLES_PER_ROUTE, MAX_SAMPLES_GLOBAL)
    }

    pub fn with_capacities(route_capacity: usize, global_capacity: usize) -> Self {
        Self {
            routes: DashMap::new(),
            global: Mutex::new(VecDeque::with_capacity(global_capacity.min(1024))),
            route_capacity: route_capacity.max(1),
            global_capacity: global_capacity.max(1),
            recorded: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Record one completed request. Always succeeds from the caller's
    /// perspective; invalid input (empty route/method, negative or
    /// non-finite latency) bumps the dropped counter and returns.
    pub fn record(
        &self,
        route: &str,
        method: &str,
        status_code: u16,
        latency_ms: f64,
        timestamp: DateTime<Utc>,
    ) {
        if route.is_empty() || method.is_empty() || !latency_ms.is_finite() || latency_ms < 0.0 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(route, method, latency_ms, "dropped malformed sample");
            return;
        }

        let sample = Sample {
            timestamp,
            route: route.to_owned(),
            method: method.to_uppercase(),
            status_code,
            latency_ms,
        };
        let key = RouteKey::new(route, method);

        {
            let entry = self
                .routes
                .entry(key)
                .or_insert_with(|| Mutex::new(VecDeque::new()));
            let mut history = entry.lock();
            Self::push_bounded(&mut history, sample.clone(), self.route_capacity);
        }

        {
            let mut global = self.global.lock();
            Self::push_bounded(&mut global, sample, self.global_capacity);
        }

        self.recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Append keeping the ring invariants: drop samples older than the
    /// maximum window, then drop from the front past capacity.
    fn push_bounded(history: &mut VecDeque<Sample>, sample: Sample, capacity: usize) {
        let cutoff = sample.timestamp - Duration::seconds(MAX_WINDOW_SECONDS);
        while history.front().is_some_and(|s| s.timestamp < cutoff) {
            history.pop_front();
        }
        history.push_back(sample);
        while history.len() > capacity {
            history.pop_front();
        }
    }

    // ─── Read side ──────────────────────────────────────────────

    /// Snapshot copy of the global history. Concurrent appends during
    /// a copy neither block long nor corrupt the read.
    pub fn global_samples(&self) -> Vec<Sample> {
        self.global.lock().iter().cloned().collect()
    }

    /// Snapshot copy of one route's history (empty if unknown).
    pub fn route_samples(&self, key: &RouteKey) -> Vec<Sample> {
        self.routes
            .get(key)
            .map(|entry| entry.lock().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every route seen so far, sorted ascending.
    pub fn route_keys(&self) -> Vec<RouteKey> {
        let mut keys: Vec<RouteKey> = self.routes.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn recorded(&self) -> u64 {
        self.recorded.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for SampleRecorder {
    fn default() -> Self {
        Self::new()
    }
}

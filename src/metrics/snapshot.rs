use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::Thresholds;

use super::aggregator::{self, WindowMetrics};
use super::cache_stats::{CacheCounters, CacheMetrics};
use super::recorder::SampleRecorder;
use super::status::{self, HealthStatus};
use super::workers::{WorkerCollector, WorkerSnapshot};

// ─── Parameter policy ────────────────────────────────────────────

/// Windows the dashboard may ask for.
pub const ALLOWED_WINDOWS: [u32; 3] = [300, 900, 3600];

/// Fallback for absent or invalid `window_seconds`.
pub const DEFAULT_WINDOW_SECONDS: u32 = 900;

/// Fallback for absent or invalid `limit`.
pub const DEFAULT_ROUTE_LIMIT: usize = 100;

/// Field selector for route listings, mapped from the query string at
/// the API boundary. Unknown fields fall back to p95 latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    P95LatencyMs,
    ErrorRate,
    RequestCount,
}

impl SortBy {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "error_rate" => Self::ErrorRate,
            "request_count" => Self::RequestCount,
            _ => Self::P95LatencyMs,
        }
    }
}

/// Listing direction; anything that is not "asc" means descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }
}

// ─── Response types ──────────────────────────────────────────────

/// Identity and counters of this server process, shown on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub instance_id: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub samples_recorded: u64,
    pub samples_dropped: u64,
}

/// Windowed metrics for one `(route, method)` pair.
#[derive(Debug, Clone, Serialize)]
pub struct RouteMetrics {
    pub route: String,
    pub method: String,
    #[serde(flatten)]
    pub metrics: WindowMetrics,
}

/// The fully composed dashboard response. Internally consistent for a
/// given parameter set and instant; `generated_at` identifies the
/// computation that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSnapshot {
    pub generated_at: DateTime<Utc>,
    pub window_seconds: u32,
    pub server: ServerInfo,
    pub global: WindowMetrics,
    pub cache: CacheMetrics,
    pub workers: WorkerSnapshot,
    pub status: HealthStatus,
    /// Per-route metrics, present only when requested
    pub routes: Option<Vec<RouteMetrics>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteMetricsResponse {
    pub window_seconds: u32,
    pub routes: Vec<RouteMetrics>,
}

// ─── Composer ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SnapshotKey {
    window_seconds: u32,
    include_routes: bool,
    include_workers: bool,
}

#[derive(Default)]
struct CacheSlot {
    cached: Option<(Instant, PerformanceSnapshot)>,
}

/// The query façade: validates parameters, reads the recorder through
/// the aggregator, folds in worker and cache state, and caches the
/// composed result per parameter set for a short TTL.
///
/// One async mutex per cache key gives single-flight composition:
/// callers arriving while a computation is in flight wait for it and
/// share the identical result rather than recomputing.
pub struct SnapshotComposer {
    recorder: Arc<SampleRecorder>,
    workers: Arc<WorkerCollector>,
    cache_counters: Arc<CacheCounters>,
    thresholds: Thresholds,
    ttl: Duration,
    instance_id: String,
    started_at: DateTime<Utc>,
    start_instant: Instant,
    slots: DashMap<SnapshotKey, Arc<Mutex<CacheSlot>>>,
}

impl SnapshotComposer {
    pub fn new(
        recorder: Arc<SampleRecorder>,
        workers: Arc<WorkerCollector>,
        cache_counters: Arc<CacheCounters>,
        thresholds: Thresholds,
        ttl: Duration,
    ) -> Self {
        Self {
            recorder,
            workers,
            cache_counters,
            thresholds,
            ttl,
            instance_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            start_instant: Instant::now(),
            slots: DashMap::new(),
        }
    }

    /// Clamp `window_seconds` to the allowed set, falling back to the
    /// default. Silent fallback is the documented policy for the whole
    /// query surface — the dashboard must always render.
    pub fn normalize_window(window_seconds: u32) -> u32 {
        if ALLOWED_WINDOWS.contains(&window_seconds) {
            window_seconds
        } else {
            DEFAULT_WINDOW_SECONDS
        }
    }

    /// Composed snapshot for the given parameters, served from the
    /// per-key cache within the TTL.
    pub async fn get_snapshot(
        &self,
        window_seconds: u32,
        include_routes: bool,
        include_workers: bool,
    ) -> PerformanceSnapshot {
        let window = Self::normalize_window(window_seconds);
        let key = SnapshotKey {
            window_seconds: window,
            include_routes,
            include_workers,
        };

        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(CacheSlot::default())))
            .clone();

        let mut slot = slot.lock().await;
        if let Some((cached_at, snapshot)) = &slot.cached {
            if cached_at.elapsed() < self.ttl {
                return snapshot.clone();
            }
        }

        let snapshot = self.compose(window, include_routes, include_workers).await;
        slot.cached = Some((Instant::now(), snapshot.clone()));
        snapshot
    }

    /// Per-route metrics for every known route, sorted and truncated.
    /// Unlike snapshots these are not cached; the dashboard fetches the
    /// table on demand.
    pub fn get_route_metrics(
        &self,
        window_seconds: u32,
        sort_by: SortBy,
        order: SortOrder,
        limit: usize,
    ) -> RouteMetricsResponse {
        let window = Self::normalize_window(window_seconds);
        let now = Utc::now();
        let mut routes = self.all_route_metrics(window, now);

        routes.sort_by(|a, b| {
            let ordering = match sort_by {
                SortBy::P95LatencyMs => a.metrics.p95_latency_ms.total_cmp(&b.metrics.p95_latency_ms),
                SortBy::ErrorRate => a.metrics.error_rate.total_cmp(&b.metrics.error_rate),
                SortBy::RequestCount => a.metrics.request_count.cmp(&b.metrics.request_count),
            };
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        routes.truncate(limit.max(1));

        RouteMetricsResponse {
            window_seconds: window,
            routes,
        }
    }

    /// Thin pass-through to the worker collector.
    pub async fn get_worker_metrics(&self) -> WorkerSnapshot {
        self.workers.collect().await
    }

    async fn compose(
        &self,
        window: u32,
        include_routes: bool,
        include_workers: bool,
    ) -> PerformanceSnapshot {
        let now = Utc::now();

        let global = aggregator::compute(&self.recorder.global_samples(), window, now);
        let cache = self.cache_counters.snapshot();
        let workers = if include_workers {
            self.workers.collect().await
        } else {
            WorkerSnapshot::disabled()
        };
        let status = status::evaluate(&self.thresholds, &global, &cache, &workers);
        let routes = include_routes.then(|| self.all_route_metrics(window, now));

        PerformanceSnapshot {
            generated_at: now,
            window_seconds: window,
            server: self.server_info(),
            global,
            cache,
            workers,
            status,
            routes,
        }
    }

    /// Metrics for every known route, ordered by route key ascending.
    fn all_route_metrics(&self, window: u32, now: DateTime<Utc>) -> Vec<RouteMetrics> {
        self.recorder
            .route_keys()
            .into_iter()
            .map(|key| {
                let metrics = aggregator::compute(&self.recorder.route_samples(&key), window, now);
                RouteMetrics {
                    route: key.route,
                    method: key.method,
                    metrics,
                }
            })
            .collect()
    }

    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            instance_id: self.instance_id.clone(),
            started_at: self.started_at,
            uptime_seconds: self.start_instant.elapsed().as_secs(),
            samples_recorded: self.recorder.recorded(),
            samples_dropped: self.recorder.dropped(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer_with_ttl(ttl: Duration) -> SnapshotComposer {
        SnapshotComposer::new(
            Arc::new(SampleRecorder::new()),
            Arc::new(WorkerCollector::disabled()),
            Arc::new(CacheCounters::new()),
            Thresholds::default(),
            ttl,
        )
    }

    fn record_n(composer: &SnapshotComposer, route: &str, total: u32, errors: u32) {
        let now = Utc::now();
        for i in 0..total {
            let status = if i < errors { 500 } else { 200 };
            composer.recorder.record(route, "GET", status, 10.0 + i as f64, now);
        }
    }

    #[tokio::test]
    async fn invalid_window_falls_back_to_default() {
        let composer = composer_with_ttl(Duration::from_secs(5));
        record_n(&composer, "/a", 5, 0);

        let odd = composer.get_snapshot(42, false, true).await;
        assert_eq!(odd.window_seconds, DEFAULT_WINDOW_SECONDS);

        // Same normalized key: the cached snapshot is shared verbatim
        let default = composer.get_snapshot(900, false, true).await;
        assert_eq!(odd.generated_at, default.generated_at);
        assert_eq!(odd.global.request_count, default.global.request_count);
    }

    #[tokio::test]
    async fn snapshot_is_cached_within_ttl() {
        let composer = composer_with_ttl(Duration::from_secs(5));
        record_n(&composer, "/a", 3, 0);

        let first = composer.get_snapshot(900, false, true).await;
        record_n(&composer, "/a", 3, 0);
        let second = composer.get_snapshot(900, false, true).await;

        // Identical cached object, including generated_at and counts
        assert_eq!(first.generated_at, second.generated_at);
        assert_eq!(second.global.request_count, 3);
    }

    #[tokio::test]
    async fn snapshot_recomputes_after_ttl_expiry() {
        let composer = composer_with_ttl(Duration::ZERO);
        record_n(&composer, "/a", 3, 0);

        let first = composer.get_snapshot(900, false, true).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = composer.get_snapshot(900, false, true).await;

        assert!(second.generated_at > first.generated_at);
    }

    #[tokio::test]
    async fn distinct_parameter_sets_cache_independently() {
        let composer = composer_with_ttl(Duration::from_secs(5));
        record_n(&composer, "/a", 2, 0);

        let without_routes = composer.get_snapshot(900, false, true).await;
        let with_routes = composer.get_snapshot(900, true, true).await;

        assert!(without_routes.routes.is_none());
        let routes = with_routes.routes.expect("routes requested");
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].route, "/a");
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_computation() {
        let composer = Arc::new(composer_with_ttl(Duration::from_secs(5)));
        record_n(&composer, "/a", 2, 0);

        let (a, b) = tokio::join!(
            composer.get_snapshot(900, true, true),
            composer.get_snapshot(900, true, true),
        );
        assert_eq!(a.generated_at, b.generated_at);
    }

    #[tokio::test]
    async fn excluding_workers_yields_disabled_sentinel() {
        let composer = composer_with_ttl(Duration::from_secs(5));
        let snapshot = composer.get_snapshot(900, false, false).await;

        assert_eq!(snapshot.workers.status, HealthStatus::Disabled);
        assert_eq!(snapshot.workers.worker_count, 0);
    }

    #[tokio::test]
    async fn empty_history_reports_no_data() {
        let composer = composer_with_ttl(Duration::from_secs(5));
        let snapshot = composer.get_snapshot(900, false, true).await;

        assert!(snapshot.global.no_data);
        assert_eq!(snapshot.global.request_count, 0);
        assert_eq!(snapshot.status, HealthStatus::Good);
    }

    #[test]
    fn route_metrics_sort_and_truncate() {
        let composer = composer_with_ttl(Duration::from_secs(5));
        // Error rates: /a = 0.10, /b = 0.02
        record_n(&composer, "/a", 10, 1);
        record_n(&composer, "/b", 50, 1);

        let top = composer.get_route_metrics(900, SortBy::ErrorRate, SortOrder::Desc, 1);
        assert_eq!(top.routes.len(), 1);
        assert_eq!(top.routes[0].route, "/a");

        let by_count = composer.get_route_metrics(900, SortBy::RequestCount, SortOrder::Asc, 10);
        assert_eq!(by_count.routes[0].route, "/a");
        assert_eq!(by_count.routes[1].route, "/b");
    }

    #[test]
    fn sort_selectors_parse_with_fallback() {
        assert_eq!(SortBy::parse("error_rate"), SortBy::ErrorRate);
        assert_eq!(SortBy::parse("request_count"), SortBy::RequestCount);
        assert_eq!(SortBy::parse("p95_latency_ms"), SortBy::P95LatencyMs);
        assert_eq!(SortBy::parse("bogus"), SortBy::P95LatencyMs);

        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse(""), SortOrder::Desc);
    }

    #[test]
    fn generated_at_serializes_with_utc_suffix() {
        let composer = composer_with_ttl(Duration::from_secs(5));
        let json = serde_json::to_value(composer.server_info()).unwrap();
        let started_at = json["started_at"].as_str().unwrap();
        assert!(started_at.ends_with('Z'), "expected Z suffix, got {started_at}");
    }
}

use serde::Serialize;

use crate::config::Thresholds;

use super::aggregator::WindowMetrics;
use super::cache_stats::CacheMetrics;
use super::workers::WorkerSnapshot;

/// Health signal shown on the dashboard. `Disabled` is only ever
/// reported by subsystems that are not configured (workers); the
/// overall evaluation yields one of the first three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Good,
    Warning,
    Critical,
    Disabled,
}

/// Reduce aggregated numbers to a single status: each rule proposes a
/// level and the worst one wins. Critical bounds short-circuit.
pub fn evaluate(
    thresholds: &Thresholds,
    global: &WindowMetrics,
    cache: &CacheMetrics,
    workers: &WorkerSnapshot,
) -> HealthStatus {
    let mut status = HealthStatus::Good;

    if !global.no_data {
        if global.p95_latency_ms >= thresholds.p95_critical_ms
            || global.error_rate >= thresholds.error_rate_critical
        {
            return HealthStatus::Critical;
        }
        if global.p95_latency_ms >= thresholds.p95_warning_ms
            || global.error_rate >= thresholds.error_rate_warning
        {
            status = HealthStatus::Warning;
        }
    }

    // Only judge the cache once it has seen real traffic
    if cache.total_lookups >= thresholds.cache_min_lookups
        && cache.hit_rate < thresholds.cache_hit_rate_warning
    {
        status = status.max(HealthStatus::Warning);
    }

    if workers.status != HealthStatus::Disabled {
        let backlog = workers.queues.iter().map(|q| q.pending).max().unwrap_or(0);
        if backlog >= thresholds.queue_backlog_critical {
            return HealthStatus::Critical;
        }
        if backlog >= thresholds.queue_backlog_warning {
            status = status.max(HealthStatus::Warning);
        }
    }

    status
}

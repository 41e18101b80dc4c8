use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::Sample;

/// Status codes at or above this count toward the error rate.
const ERROR_STATUS: u16 = 500;

/// Metrics computed over one trailing window.
/// Serialized straight into snapshot and per-route payloads.
///
/// When no sample falls inside the window, `no_data` is true and every
/// numeric field is zero — callers must check `no_data` before reading
/// zeros as "fast and error-free".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowMetrics {
    pub request_count: u64,
    pub error_rate: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub no_data: bool,
}

impl WindowMetrics {
    /// All-zero placeholder for an empty window.
    pub fn empty() -> Self {
        Self {
            request_count: 0,
            error_rate: 0.0,
            p50_latency_ms: 0.0,
            p95_latency_ms: 0.0,
            p99_latency_ms: 0.0,
            no_data: true,
        }
    }
}

/// Aggregate the samples with `timestamp >= now - window_seconds`.
/// Boundary samples are included.
pub fn compute(samples: &[Sample], window_seconds: u32, now: DateTime<Utc>) -> WindowMetrics {
    let cutoff = now - Duration::seconds(i64::from(window_seconds));

    let mut latencies: Vec<f64> = Vec::with_capacity(samples.len());
    let mut errors = 0u64;
    for sample in samples {
        if sample.timestamp >= cutoff {
            latencies.push(sample.latency_ms);
            if sample.status_code >= ERROR_STATUS {
                errors += 1;
            }
        }
    }

    if latencies.is_empty() {
        return WindowMetrics::empty();
    }

    latencies.sort_by(|a, b| a.total_cmp(b));
    let count = latencies.len();

    WindowMetrics {
        request_count: count as u64,
        error_rate: errors as f64 / count as f64,
        p50_latency_ms: nearest_rank(&latencies, 0.50),
        p95_latency_ms: nearest_rank(&latencies, 0.95),
        p99_latency_ms: nearest_rank(&latencies, 0.99),
        no_data: false,
    }
}

/// Nearest-rank percentile over an ascending-sorted slice:
/// `index = ceil(p * count) - 1`, clamped to `[0, count - 1]`.
/// Deterministic, no interpolation.
fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let count = sorted.len();
    let rank = (p * count as f64).ceil() as usize;
    sorted[rank.saturating_sub(1).min(count - 1)]
}

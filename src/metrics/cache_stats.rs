use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Hit/miss counters for the content-cache subsystem.
///
/// The cache layer owns the lookups and calls `record_hit`/`record_miss`;
/// this subsystem only ever reads the counters into snapshots.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Read-only snapshot for the dashboard.
    pub fn snapshot(&self) -> CacheMetrics {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total_lookups = hits + misses;
        let hit_rate = if total_lookups == 0 {
            0.0
        } else {
            hits as f64 / total_lookups as f64
        };
        CacheMetrics {
            hits,
            misses,
            total_lookups,
            hit_rate,
        }
    }
}

/// Pass-through cache metrics as they appear in `PerformanceSnapshot`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub total_lookups: u64,
    /// 0.0-1.0
    pub hit_rate: f64,
}

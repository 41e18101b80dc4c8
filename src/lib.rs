//! Performance-metrics engine behind a local media server's admin
//! dashboard: per-request samples in, windowed percentile snapshots out.
//!
//! The write side is `metrics::SampleRecorder`, fed once per completed
//! request by `middleware::timing`. The read side is
//! `metrics::SnapshotComposer`, polled by the admin API every few
//! seconds and cached per parameter set.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod simulator;

use std::sync::Arc;

use metrics::cache_stats::CacheCounters;
use metrics::{SampleRecorder, SnapshotComposer};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Write side: the timing middleware pushes one sample per request.
    pub recorder: Arc<SampleRecorder>,
    /// Read side: admin handlers ask this for composed snapshots.
    pub composer: Arc<SnapshotComposer>,
    /// Hit/miss counters incremented by the content-cache layer.
    pub cache_counters: Arc<CacheCounters>,
}

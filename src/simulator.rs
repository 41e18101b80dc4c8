//! Synthetic traffic for local development.
//!
//! A freshly started instance has an empty dashboard; with
//! `simulator.enabled` the task below records randomized samples for
//! the media server's route set so every panel has live data.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::SimulatorConfig;
use crate::metrics::cache_stats::CacheCounters;
use crate::metrics::SampleRecorder;

// ─── Simulated routes ────────────────────────────────────────────

struct SimRoute {
    method: &'static str,
    route: &'static str,
    base_ms: f64,
    jitter_ms: f64,
    /// Chance (0-100) of a 500 response
    error_pct: u8,
}

/// Routes of the media server proper, each with a latency profile.
const ROUTES: &[SimRoute] = &[
    SimRoute { method: "GET", route: "/watch/:id", base_ms: 40.0, jitter_ms: 120.0, error_pct: 1 },
    SimRoute { method: "GET", route: "/api/videos", base_ms: 8.0, jitter_ms: 30.0, error_pct: 0 },
    SimRoute { method: "GET", route: "/thumbnails/:id", base_ms: 3.0, jitter_ms: 12.0, error_pct: 0 },
    SimRoute { method: "POST", route: "/api/ratings", base_ms: 12.0, jitter_ms: 45.0, error_pct: 2 },
    SimRoute { method: "GET", route: "/api/search", base_ms: 25.0, jitter_ms: 90.0, error_pct: 1 },
];

// ─── Task ────────────────────────────────────────────────────────

/// Records one randomized sample per tick until the process exits.
pub async fn run(
    config: SimulatorConfig,
    recorder: Arc<SampleRecorder>,
    cache: Arc<CacheCounters>,
) {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut ticker = tokio::time::interval(Duration::from_millis(config.interval_ms.max(1)));
    info!(interval_ms = config.interval_ms, "traffic simulator running");

    loop {
        ticker.tick().await;

        let profile = &ROUTES[rng.gen_range(0..ROUTES.len())];
        let latency_ms = profile.base_ms + rng.gen::<f64>() * profile.jitter_ms;
        let status_code = if rng.gen_range(0u8..100) < profile.error_pct {
            500
        } else {
            200
        };

        recorder.record(
            profile.route,
            profile.method,
            status_code,
            latency_ms,
            chrono::Utc::now(),
        );

        // Rough content-cache behavior: most lookups hit
        if rng.gen_bool(0.7) {
            cache.record_hit();
        } else {
            cache.record_miss();
        }
    }
}

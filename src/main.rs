use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use media_perf::config::Config;
use media_perf::error::Result;
use media_perf::metrics::cache_stats::CacheCounters;
use media_perf::metrics::workers::{self, WorkerCollector};
use media_perf::metrics::{SampleRecorder, SnapshotComposer};
use media_perf::{server, simulator, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Optional config file path as the only CLI argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    // ── 1. Sample store ──────────────────────────────────────────
    let recorder = Arc::new(SampleRecorder::with_capacities(
        config.metrics.max_samples_per_route,
        config.metrics.max_samples_global,
    ));
    let cache_counters = Arc::new(CacheCounters::new());

    // ── 2. Worker/queue collector ────────────────────────────────
    let collector = match &config.workers.redis_url {
        Some(url) => match workers::connect(url).await {
            Ok(conn) => {
                info!(%url, "connected to job subsystem");
                WorkerCollector::new(
                    conn,
                    config.workers.queues.clone(),
                    Duration::from_millis(config.workers.poll_timeout_ms),
                )
            }
            Err(e) => {
                warn!(%url, error = %e, "job subsystem unreachable, worker metrics disabled");
                WorkerCollector::disabled()
            }
        },
        None => {
            info!("no job subsystem configured, worker metrics disabled");
            WorkerCollector::disabled()
        }
    };

    // ── 3. Snapshot composer ─────────────────────────────────────
    let composer = Arc::new(SnapshotComposer::new(
        recorder.clone(),
        Arc::new(collector),
        cache_counters.clone(),
        config.thresholds.clone(),
        Duration::from_secs(config.metrics.snapshot_ttl_seconds),
    ));

    let state = Arc::new(AppState {
        recorder: recorder.clone(),
        composer,
        cache_counters: cache_counters.clone(),
    });

    // ── 4. Optional synthetic traffic ────────────────────────────
    if config.simulator.enabled {
        tokio::spawn(simulator::run(
            config.simulator.clone(),
            recorder,
            cache_counters,
        ));
    }

    // ── 5. Bind & serve ──────────────────────────────────────────
    let app = server::create_router(state, &config.server.static_dir);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!(addr = %config.server.bind_addr, "admin metrics server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

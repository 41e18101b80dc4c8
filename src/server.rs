use axum::{middleware as axum_mw, routing::get, Router};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::handlers::performance;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes, middleware, and static serving.
pub fn create_router(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        // ── Admin metrics API ───────────────────────────────────
        .route("/api/admin/performance", get(performance::get_snapshot))
        .route(
            "/api/admin/performance/routes",
            get(performance::get_route_metrics),
        )
        .route(
            "/api/admin/performance/workers",
            get(performance::get_worker_metrics),
        )
        // ── Provide shared state to all routes above ────────────
        .with_state(state.clone())
        // ── Serve static/ directory for the dashboard ───────────
        .fallback_service(ServeDir::new(static_dir))
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn_with_state(state, timing::timing_middleware))
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
}

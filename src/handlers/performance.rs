use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::metrics::snapshot::{
    PerformanceSnapshot, RouteMetricsResponse, SortBy, SortOrder, DEFAULT_ROUTE_LIMIT,
    DEFAULT_WINDOW_SECONDS,
};
use crate::metrics::workers::WorkerSnapshot;
use crate::AppState;

use super::{parse_bool, parse_u32, parse_usize};

// Params arrive as a raw string map so a bad value can never reject
// the request; defaults are applied per parameter.

// ─── GET /api/admin/performance ──────────────────────────────────

pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<PerformanceSnapshot> {
    let window_seconds =
        parse_u32(params.get("window_seconds")).unwrap_or(DEFAULT_WINDOW_SECONDS);
    let include_routes = parse_bool(params.get("include_routes")).unwrap_or(false);
    let include_workers = parse_bool(params.get("include_workers")).unwrap_or(true);

    Json(
        state
            .composer
            .get_snapshot(window_seconds, include_routes, include_workers)
            .await,
    )
}

// ─── GET /api/admin/performance/routes ───────────────────────────

pub async fn get_route_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<RouteMetricsResponse> {
    let window_seconds =
        parse_u32(params.get("window_seconds")).unwrap_or(DEFAULT_WINDOW_SECONDS);
    let sort_by = SortBy::parse(params.get("sort_by").map(String::as_str).unwrap_or(""));
    let order = SortOrder::parse(params.get("order").map(String::as_str).unwrap_or(""));
    let limit = parse_usize(params.get("limit"))
        .filter(|l| *l >= 1)
        .unwrap_or(DEFAULT_ROUTE_LIMIT);

    Json(
        state
            .composer
            .get_route_metrics(window_seconds, sort_by, order, limit),
    )
}

// ─── GET /api/admin/performance/workers ──────────────────────────

pub async fn get_worker_metrics(State(state): State<Arc<AppState>>) -> Json<WorkerSnapshot> {
    Json(state.composer.get_worker_metrics().await)
}

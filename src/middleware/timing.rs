use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::AppState;

/// Measures every served request and feeds the sample recorder.
///
/// The recorder is fail-open, so measurement can never fail or delay
/// the request it observes. The matched route template is preferred
/// over the raw path to keep route cardinality bounded; requests that
/// miss the router (static files) fall back to the literal path.
///
/// Also adds an `X-Response-Time-Ms` response header.
pub async fn timing_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let start = Instant::now();
    let mut response = next.run(req).await;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    let status = response.status().as_u16();
    state
        .recorder
        .record(&route, method.as_str(), status, latency_ms, chrono::Utc::now());

    if let Ok(val) = format!("{latency_ms:.3}").parse() {
        response.headers_mut().insert("X-Response-Time-Ms", val);
    }

    debug!(%method, %route, status, latency_ms, "request measured");
    response
}

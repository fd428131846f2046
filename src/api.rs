use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::metrics::Metrics;

/// Static body for hosting-platform health checks.
pub const LIVENESS_BODY: &str = "press-watch is running ✅";

/// `GET /` only, plus `/metrics` when a recorder is passed in.
pub fn create_router(metrics: Option<&Metrics>) -> Router {
    let mut router = Router::new().route("/", get(liveness));
    if let Some(m) = metrics {
        router = router.merge(m.router());
    }
    router.layer(TraceLayer::new_for_http())
}

async fn liveness() -> &'static str {
    LIVENESS_BODY
}

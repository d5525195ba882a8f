use axum::{middleware as axum_mw, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::metrics::stream;
use crate::middleware::timing;
use crate::AppState;

/// Mounts the metrics inspection route next to the host's own `routes`
/// and wraps everything in the telemetry hook.
pub fn create_router(state: Arc<AppState>, routes: Router) -> Router {
    Router::new()
        // ── Metrics ─────────────────────────────────────────────
        .route("/api/metrics", get(stream::get_metrics))
        // ── Provide shared state to all routes above ────────────
        .with_state(Arc::clone(&state))
        // ── Host application routes ─────────────────────────────
        .merge(routes)
        // ── Global middleware (applied bottom-up) ───────────────
        // The hook is outermost so CORS preflights are counted too.
        .layer(CorsLayer::permissive())
        .layer(axum_mw::from_fn_with_state(
            state,
            timing::telemetry_middleware,
        ))
}

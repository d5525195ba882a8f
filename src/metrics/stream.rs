use axum::{extract::State, Json};
use std::sync::Arc;

use super::PendingSnapshot;
use crate::AppState;

// ─── GET /api/metrics ────────────────────────────────────────────
/// Pending (not yet flushed) telemetry as JSON — useful for curl / debugging.
/// Reading it never resets anything.

pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Json<PendingSnapshot> {
    Json(state.metrics.peek())
}

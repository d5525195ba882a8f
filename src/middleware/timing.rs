use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

/// Identity of the caller, inserted into request extensions by whatever
/// auth layer sits in front of the telemetry hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

/// Request lifecycle hook.
///
/// Before the handler runs: counts the request under its HTTP method and
/// marks the caller active if an `AuthenticatedUser` is present.
/// After the response is produced: records the elapsed wall time (ms).
/// The clock stops when the handler returns its `Response`, not when a
/// streamed body finishes writing; buffered bodies see no difference.
///
/// Methods outside the standard set are counted under `OTHER`, so a
/// client cannot grow the per-method table without bound.
pub async fn telemetry_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let user = req
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.0.clone());

    state
        .metrics
        .record_request(method_label(&method), user.as_deref());

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    state.metrics.record_latency(elapsed_ms);

    tracing::debug!(
        status = response.status().as_u16(),
        %method,
        %path,
        elapsed_ms,
        "request handled",
    );

    response
}

/// Tag value for `method=`: the standard verbs as-is, anything else `OTHER`.
pub fn method_label(method: &Method) -> &str {
    match method.as_str() {
        "GET" | "POST" | "PUT" | "DELETE" | "PATCH" | "HEAD" | "OPTIONS" | "CONNECT"
        | "TRACE" => method.as_str(),
        _ => "OTHER",
    }
}

//! In-process telemetry for the pizza service: request, auth, order and
//! host metrics aggregated in memory and pushed as a line-protocol batch
//! on a fixed interval.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod sampler;
pub mod server;
pub mod transport;

pub use error::{Result, TelemetryError};
pub use metrics::{Aggregator, OrderItem, Scheduler};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Telemetry sink — the hook and business events record into it,
    /// the scheduler flushes it.
    pub metrics: Arc<Aggregator>,
}

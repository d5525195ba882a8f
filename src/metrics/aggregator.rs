use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use super::line::MetricBuilder;
use super::{MetricValue, OrderItem};
use crate::sampler::Sampler;
use crate::transport::Transport;

// ─── Public types ────────────────────────────────────────────────

/// Process-wide telemetry state.
///
/// Handlers and business events call the `record_*` methods from any
/// thread; the scheduler calls `flush()` / `flush_and_send()`. A single
/// mutex guards both recording and the snapshot-then-reset step, so an
/// event lands in exactly one flush.
pub struct Aggregator {
    source: String,
    sampler: Arc<dyn Sampler>,
    transport: Arc<dyn Transport>,
    inner: Mutex<Inner>,
}

/// Per-method request total, as reported by `peek()`.
#[derive(Debug, Clone, Serialize)]
pub struct MethodTotal {
    pub method: String,
    pub total: u64,
}

/// Read-only view of what the next flush would report (minus the
/// system sample, which is only taken at flush time).
#[derive(Debug, Clone, Serialize)]
pub struct PendingSnapshot {
    pub captured_at: DateTime<Utc>,
    pub source: String,

    // Cumulative
    pub requests: Vec<MethodTotal>,
    pub requests_total: u64,
    pub auth_success: u64,
    pub auth_failure: u64,

    // Reset every flush
    pub active_users: usize,
    pub pizza_sold: u64,
    pub pizza_failures: u64,
    pub pizza_revenue: f64,
    pub request_latency_count: usize,
    pub request_latency_avg_ms: Option<f64>,
    pub order_latency_count: usize,
    pub order_latency_avg_ms: Option<f64>,
}

// ─── Internal state ──────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
struct AuthCounters {
    success: u64,
    failure: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct PizzaMetrics {
    sold: u64,
    failures: u64,
    revenue: f64,
}

#[derive(Default)]
struct Inner {
    // Never reset. Vec keeps first-seen order for emission.
    requests: Vec<(String, u64)>,
    auth: AuthCounters,

    // Reset on every flush
    active_users: HashSet<String>,
    pizza: PizzaMetrics,
    request_latency: Vec<f64>,
    order_latency: Vec<f64>,
}

/// Everything one flush reports, captured under the lock.
struct Interval {
    requests: Vec<(String, u64)>,
    auth: AuthCounters,
    active_users: usize,
    pizza: PizzaMetrics,
    request_latency: Vec<f64>,
    order_latency: Vec<f64>,
}

// ─── Aggregator impl ─────────────────────────────────────────────

impl Aggregator {
    pub fn new(
        source: impl Into<String>,
        sampler: Arc<dyn Sampler>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            source: source.into(),
            sampler,
            transport,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Count one inbound request; remember the caller if authenticated.
    /// The matching duration arrives later through `record_latency`.
    pub fn record_request(&self, method: &str, user_id: Option<&str>) {
        let mut inner = self.inner.lock();
        match inner.requests.iter().position(|(m, _)| m == method) {
            Some(i) => inner.requests[i].1 += 1,
            None => inner.requests.push((method.to_string(), 1)),
        }
        if let Some(id) = user_id {
            if !inner.active_users.contains(id) {
                inner.active_users.insert(id.to_string());
            }
        }
    }

    /// Request wall time in milliseconds. Negative or NaN clamps to 0.
    pub fn record_latency(&self, duration_ms: f64) {
        self.inner.lock().request_latency.push(clamp_ms(duration_ms));
    }

    pub fn record_auth_attempt(&self, success: bool) {
        let mut inner = self.inner.lock();
        if success {
            inner.auth.success += 1;
        } else {
            inner.auth.failure += 1;
        }
    }

    /// A finished order. Latency is recorded whether or not it succeeded.
    pub fn record_order(&self, items: &[OrderItem], success: bool, latency_ms: f64) {
        let mut inner = self.inner.lock();
        if success {
            inner.pizza.sold += items.len() as u64;
            inner.pizza.revenue += items.iter().map(|i| i.price).sum::<f64>();
        } else {
            inner.pizza.failures += 1;
        }
        inner.order_latency.push(clamp_ms(latency_ms));
    }

    /// Snapshot every category, apply the reset policy, and return the
    /// encoded batch. The system sample is read fresh from the sampler
    /// after the lock is released; if sampling fails only those two
    /// samples are left out.
    pub fn flush(&self) -> String {
        self.build_batch().encode()
    }

    /// `flush()` followed by one best-effort send. Failures are logged and
    /// the interval's data is dropped.
    pub async fn flush_and_send(&self) {
        let builder = self.build_batch();
        let batch = builder.encode();

        match self.transport.send(&batch).await {
            Ok(()) => tracing::debug!(
                samples = builder.len(),
                bytes = batch.len(),
                "metrics batch sent",
            ),
            Err(e) => tracing::warn!(error = %e, "failed to send metrics"),
        }
    }

    /// What the next flush would report, without resetting anything.
    pub fn peek(&self) -> PendingSnapshot {
        let inner = self.inner.lock();
        PendingSnapshot {
            captured_at: Utc::now(),
            source: self.source.clone(),
            requests: inner
                .requests
                .iter()
                .map(|(method, total)| MethodTotal {
                    method: method.clone(),
                    total: *total,
                })
                .collect(),
            requests_total: inner.requests.iter().map(|(_, c)| c).sum(),
            auth_success: inner.auth.success,
            auth_failure: inner.auth.failure,
            active_users: inner.active_users.len(),
            pizza_sold: inner.pizza.sold,
            pizza_failures: inner.pizza.failures,
            pizza_revenue: inner.pizza.revenue,
            request_latency_count: inner.request_latency.len(),
            request_latency_avg_ms: average(&inner.request_latency),
            order_latency_count: inner.order_latency.len(),
            order_latency_avg_ms: average(&inner.order_latency),
        }
    }

    fn build_batch(&self) -> MetricBuilder {
        let interval = self.inner.lock().take_interval();
        let mut b = MetricBuilder::new(self.source.as_str());

        // ── Requests (cumulative) ───────────────────────────────
        let mut total = 0u64;
        for (method, count) in &interval.requests {
            total += count;
            b.add("request", "total", *count, &[("method", method.as_str())]);
        }
        b.add("request", "total", total, &[("method", "all")]);

        // ── Active users ────────────────────────────────────────
        b.add("users", "active", interval.active_users, &[]);

        // ── Auth (cumulative) ───────────────────────────────────
        b.add("auth", "attempts_success", interval.auth.success, &[]);
        b.add("auth", "attempts_failure", interval.auth.failure, &[]);

        // ── System ──────────────────────────────────────────────
        match self.sampler.sample() {
            Ok(usage) => {
                b.add("system", "cpu_usage", MetricValue::fixed2(usage.cpu_percent), &[]);
                b.add("system", "memory_usage", MetricValue::fixed2(usage.mem_percent), &[]);
            }
            Err(e) => tracing::warn!(error = %e, "system sampling failed; skipping system metrics"),
        }

        // ── Pizza ───────────────────────────────────────────────
        b.add("pizza", "sold", interval.pizza.sold, &[]);
        b.add("pizza", "failures", interval.pizza.failures, &[]);
        b.add("pizza", "revenue", interval.pizza.revenue, &[]);

        // ── Latency (only when observed) ────────────────────────
        if let Some(avg) = average(&interval.request_latency) {
            b.add("latency", "average", avg, &[]);
        }
        if let Some(avg) = average(&interval.order_latency) {
            b.add("latency", "pizza", avg, &[]);
        }

        b
    }
}

// ─── Inner impl ──────────────────────────────────────────────────

impl Inner {
    /// Copy cumulative counters and move out per-interval state, leaving
    /// the per-interval categories empty.
    fn take_interval(&mut self) -> Interval {
        let active_users = self.active_users.len();
        self.active_users.clear();

        Interval {
            requests: self.requests.clone(),
            auth: self.auth,
            active_users,
            pizza: std::mem::take(&mut self.pizza),
            request_latency: std::mem::take(&mut self.request_latency),
            order_latency: std::mem::take(&mut self.order_latency),
        }
    }
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn clamp_ms(v: f64) -> f64 {
    // f64::max returns the non-NaN operand.
    v.max(0.0)
}

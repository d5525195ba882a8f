pub mod aggregator;
pub mod line;
pub mod scheduler;
pub mod stream;

pub use aggregator::{Aggregator, PendingSnapshot};
pub use line::MetricBuilder;
pub use scheduler::Scheduler;

use serde::Deserialize;

/// One line of a batch: measurement prefix, ordered tags, one field.
///
/// Tag order is part of the wire format, so tags are a `Vec` rather than
/// a map. The `source` tag always comes first.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub prefix: String,
    pub tags: Vec<(String, String)>,
    pub field: String,
    pub value: MetricValue,
}

/// Field value. Rendered with its natural text form; see `line.rs`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Integer(u64),
    Float(f64),
    /// Decimal rendered with a fixed number of places (e.g. `12.30`).
    Fixed { value: f64, places: usize },
    Text(String),
}

impl MetricValue {
    pub fn fixed2(value: f64) -> Self {
        Self::Fixed { value, places: 2 }
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        Self::Integer(v)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        Self::Integer(v as u64)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// A line item of a completed order. Only the price matters here.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderItem {
    pub price: f64,
}

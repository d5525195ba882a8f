#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use pizza_metrics::sampler::{Sampler, SystemUsage};
use pizza_metrics::transport::Transport;
use pizza_metrics::{Aggregator, Result};

pub struct FixedSampler;

impl Sampler for FixedSampler {
    fn sample(&self) -> Result<SystemUsage> {
        Ok(SystemUsage {
            cpu_percent: 1.0,
            mem_percent: 2.0,
        })
    }
}

/// Records every batch; optionally sleeps before returning to simulate a
/// slow backend.
#[derive(Default)]
pub struct RecordingTransport {
    pub started: AtomicUsize,
    pub batches: Mutex<Vec<String>>,
    pub delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn batches(&self) -> Vec<String> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, batch: &str) -> Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.batches.lock().push(batch.to_string());
        Ok(())
    }
}

pub fn aggregator(transport: Arc<RecordingTransport>) -> Arc<Aggregator> {
    Arc::new(Aggregator::new("svc1", Arc::new(FixedSampler), transport))
}

/// Pull the integer value of the line starting with `prefix` (e.g.
/// `"request,source=svc1,method=all total="`).
pub fn int_field(batch: &str, prefix: &str) -> Option<u64> {
    batch
        .lines()
        .find_map(|l| l.strip_prefix(prefix))
        .and_then(|v| v.parse().ok())
}

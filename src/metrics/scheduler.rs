use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use super::Aggregator;

/// Drives `Aggregator::flush_and_send` on a fixed period.
///
/// Each tick runs in its own task, so a slow send can overlap the next
/// tick; the aggregator's lock is the only coordination. `shutdown()`
/// stops ticking, waits for in-flight sends, then flushes once more.
pub struct Scheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Start ticking. The first flush fires one full `period` from now.
    pub fn spawn(aggregator: Arc<Aggregator>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(aggregator, period, cancel.clone()));
        Self { cancel, handle }
    }

    /// Token watched by the tick loop. Cancelling it stops ticking and
    /// triggers the final flush, same as `shutdown()` minus the wait.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop ticking and drain: in-flight flushes finish, then one final
    /// flush reports whatever accumulated since the last tick.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "metrics scheduler task failed");
        }
    }
}

async fn run(aggregator: Arc<Aggregator>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = IntervalStream::new(interval);
    let mut in_flight = JoinSet::new();

    tracing::info!(period_ms = period.as_millis() as u64, "metrics scheduler started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            Some(_) = ticks.next() => {
                let aggregator = Arc::clone(&aggregator);
                in_flight.spawn(async move { aggregator.flush_and_send().await });
            }

            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    tracing::warn!(error = %e, "metrics flush task failed");
                }
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            tracing::warn!(error = %e, "metrics flush task failed");
        }
    }

    aggregator.flush_and_send().await;
    tracing::info!("metrics scheduler stopped after final flush");
}

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use pizza_metrics::{OrderItem, Scheduler};
use support::{aggregator, int_field, RecordingTransport};

#[tokio::test(start_paused = true)]
async fn ticks_every_period_then_drains_on_shutdown() {
    let transport = Arc::new(RecordingTransport::default());
    let agg = aggregator(Arc::clone(&transport));
    let scheduler = Scheduler::spawn(Arc::clone(&agg), Duration::from_secs(1));

    agg.record_request("GET", Some("u1"));
    tokio::time::sleep(Duration::from_millis(2500)).await;

    // Ticks at 1s and 2s.
    let batches = transport.batches();
    assert_eq!(batches.len(), 2);
    assert!(batches[0].contains("users,source=svc1 active=1"));
    assert!(batches[1].contains("users,source=svc1 active=0"));

    agg.record_order(&[OrderItem { price: 9.5 }], true, 12.0);
    scheduler.shutdown().await;

    let batches = transport.batches();
    assert_eq!(batches.len(), 3);
    let last = &batches[2];
    assert_eq!(int_field(last, "pizza,source=svc1 sold="), Some(1));
    assert!(last.contains("pizza,source=svc1 revenue=9.5"));
    assert_eq!(int_field(last, "request,source=svc1,method=all total="), Some(1));
}

#[tokio::test(start_paused = true)]
async fn first_tick_waits_a_full_period() {
    let transport = Arc::new(RecordingTransport::default());
    let agg = aggregator(Arc::clone(&transport));
    let scheduler = Scheduler::spawn(agg, Duration::from_secs(10));

    tokio::time::sleep(Duration::from_secs(9)).await;
    assert!(transport.batches().is_empty());

    scheduler.shutdown().await;
    assert_eq!(transport.batches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_sends_overlap_and_are_awaited_on_shutdown() {
    let transport = Arc::new(RecordingTransport::slow(Duration::from_millis(2500)));
    let agg = aggregator(Arc::clone(&transport));
    let scheduler = Scheduler::spawn(agg, Duration::from_secs(1));

    tokio::time::sleep(Duration::from_millis(3200)).await;

    // Three ticks fired although the first send has not finished yet.
    assert_eq!(transport.started.load(Ordering::SeqCst), 3);
    assert!(transport.batches().is_empty());

    scheduler.shutdown().await;

    // The three in-flight sends plus the final drain.
    assert_eq!(transport.started.load(Ordering::SeqCst), 4);
    assert_eq!(transport.batches().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn cancel_token_stops_ticking() {
    let transport = Arc::new(RecordingTransport::default());
    let agg = aggregator(Arc::clone(&transport));
    let scheduler = Scheduler::spawn(agg, Duration::from_secs(1));

    scheduler.cancel_token().cancel();
    tokio::time::sleep(Duration::from_secs(5)).await;

    // Only the final drain ran.
    assert_eq!(transport.batches().len(), 1);
    scheduler.shutdown().await;
    assert_eq!(transport.batches().len(), 1);
}

mod common;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use batchwatch_api::mock::{MockData, MockService};
use batchwatch_core::BatchOrder;
use batchwatch_core::test_helpers::make_batch;
use batchwatch_dashboard::{BatchFeed, PollOutcome};

use common::client;

const LONG: Duration = Duration::from_secs(60);

async fn two_batch_service() -> MockService {
    MockService::start(MockData {
        batches: vec![make_batch(1, 50, 0.35), make_batch(2, 10, 0.15)],
        ..MockData::default()
    })
    .await
}

#[tokio::test]
async fn refresh_publishes_series_in_service_order() {
    let service = two_batch_service().await;
    let feed = BatchFeed::new("cost_trend", client(&service), 20, LONG);
    let rx = feed.subscribe();

    let outcome = feed.refresh(&CancellationToken::new()).await;

    assert_eq!(outcome, PollOutcome::Updated);
    assert_eq!(service.last_limit(), Some(20));
    let series = rx.borrow().clone();
    assert_eq!(series.labels, vec!["Batch 1", "Batch 2"]);
    assert_eq!(series.cost, vec![0.35, 0.15]);
    assert!((series.efficiency[0] - 7.0).abs() < 1e-9);
    assert!((series.efficiency[1] - 15.0).abs() < 1e-9);
}

#[tokio::test]
async fn reversed_order_flips_display() {
    let service = two_batch_service().await;
    let feed = BatchFeed::new("efficiency", client(&service), 15, LONG)
        .with_order(BatchOrder::Reversed);
    let rx = feed.subscribe();

    feed.refresh(&CancellationToken::new()).await;

    assert_eq!(service.last_limit(), Some(15));
    assert_eq!(rx.borrow().labels, vec!["Batch 2", "Batch 1"]);
}

#[tokio::test]
async fn failed_fetch_keeps_previous_series() {
    let service = two_batch_service().await;
    let feed = BatchFeed::new("cost_trend", client(&service), 20, LONG);
    let mut rx = feed.subscribe();
    let token = CancellationToken::new();
    assert_eq!(feed.refresh(&token).await, PollOutcome::Updated);
    rx.borrow_and_update();

    service.update(|d| d.malformed = true);
    assert_eq!(feed.refresh(&token).await, PollOutcome::Failed);

    assert!(!rx.has_changed().unwrap());
    assert_eq!(rx.borrow().len(), 2);
}

#[tokio::test]
async fn empty_history_publishes_empty_series() {
    let service = MockService::start(MockData::default()).await;
    let feed = BatchFeed::new("cost_trend", client(&service), 20, LONG);
    let mut rx = feed.subscribe();

    assert_eq!(
        feed.refresh(&CancellationToken::new()).await,
        PollOutcome::Updated
    );
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_empty());
}

#[tokio::test]
async fn mounted_feed_refreshes_on_its_cadence() {
    let service = two_batch_service().await;
    let (tx, mut outcomes) = mpsc::unbounded_channel();
    let feed = BatchFeed::new("cost_trend", client(&service), 20, Duration::from_millis(150))
        .report_outcomes(tx);

    let (mounted, _rx) = feed.mount();
    for _ in 0..3 {
        let outcome = tokio::time::timeout(Duration::from_secs(2), outcomes.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, PollOutcome::Updated);
    }
    mounted.unmount_and_wait().await;

    assert!(service.batch_hits() >= 3);
}

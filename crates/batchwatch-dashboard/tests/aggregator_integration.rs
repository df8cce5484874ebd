mod common;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use batchwatch_api::mock::{MockData, MockService};
use batchwatch_core::AggregatorState;
use batchwatch_core::test_helpers::{make_database_stats, make_worker_stats};
use batchwatch_dashboard::{PollOutcome, StatsAggregator, Visibility};

use common::{client, healthy_service};

const LONG: Duration = Duration::from_secs(60);

async fn next(rx: &mut mpsc::UnboundedReceiver<PollOutcome>) -> PollOutcome {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("poll outcome in time")
        .expect("aggregator still running")
}

#[tokio::test]
async fn first_poll_with_worker_failure_stays_loading() {
    let service = MockService::start(MockData {
        database: Some(make_database_stats(50, 10)),
        worker: None,
        ..MockData::default()
    })
    .await;
    let aggregator = StatsAggregator::new(client(&service), Visibility::new(), LONG);
    let rx = aggregator.subscribe();

    let outcome = aggregator.poll(&CancellationToken::new()).await;

    assert_eq!(outcome, PollOutcome::Failed);
    assert_eq!(aggregator.state(), AggregatorState::Loading);
    assert!(!rx.has_changed().unwrap());
    assert_eq!(service.database_hits(), 1);
    assert_eq!(service.worker_hits(), 1);
}

#[tokio::test]
async fn successful_poll_merges_both_sources() {
    let service = healthy_service().await;
    let aggregator = StatsAggregator::new(client(&service), Visibility::new(), LONG);

    let outcome = aggregator.poll(&CancellationToken::new()).await;

    assert_eq!(outcome, PollOutcome::Updated);
    let state = aggregator.state();
    let vm = state.view_model().unwrap();
    assert_eq!(vm.database, make_database_stats(120, 100));
    assert_eq!(vm.worker, make_worker_stats(3));
}

#[tokio::test]
async fn failure_after_success_keeps_last_snapshot() {
    let service = healthy_service().await;
    let aggregator = StatsAggregator::new(client(&service), Visibility::new(), LONG);
    let token = CancellationToken::new();
    assert_eq!(aggregator.poll(&token).await, PollOutcome::Updated);

    service.update(|d| {
        d.database = Some(make_database_stats(999, 999));
        d.worker = None;
    });
    assert_eq!(aggregator.poll(&token).await, PollOutcome::Failed);

    let state = aggregator.state();
    assert_eq!(
        state.view_model().unwrap().database,
        make_database_stats(120, 100)
    );
}

#[tokio::test]
async fn hidden_tick_sends_no_requests() {
    let service = healthy_service().await;
    let visibility = Visibility::new();
    let aggregator = StatsAggregator::new(client(&service), visibility.clone(), LONG);

    visibility.set_visible(false);
    let outcome = aggregator.tick(&CancellationToken::new()).await;

    assert_eq!(outcome, PollOutcome::Skipped);
    assert_eq!(service.database_hits(), 0);
    assert_eq!(service.worker_hits(), 0);
}

#[tokio::test]
async fn cancelled_token_discards_result() {
    let service = healthy_service().await;
    let aggregator = StatsAggregator::new(client(&service), Visibility::new(), LONG);
    let token = CancellationToken::new();
    token.cancel();

    let outcome = aggregator.poll(&token).await;

    assert_eq!(outcome, PollOutcome::Discarded);
    assert_eq!(aggregator.state(), AggregatorState::Loading);
    assert_eq!(service.database_hits(), 1);
}

#[tokio::test]
async fn mount_polls_immediately() {
    let service = healthy_service().await;
    let (tx, mut outcomes) = mpsc::unbounded_channel();
    let aggregator = StatsAggregator::new(client(&service), Visibility::new(), LONG)
        .report_outcomes(tx);

    let (mounted, mut rx) = aggregator.mount();

    assert_eq!(next(&mut outcomes).await, PollOutcome::Updated);
    rx.changed().await.unwrap();
    assert!(rx.borrow().is_ready());
    mounted.unmount();
}

#[tokio::test]
async fn hidden_interval_is_skipped_and_resumes_on_schedule() {
    let service = healthy_service().await;
    let visibility = Visibility::new();
    let (tx, mut outcomes) = mpsc::unbounded_channel();
    let aggregator = StatsAggregator::new(
        client(&service),
        visibility.clone(),
        Duration::from_millis(300),
    )
    .report_outcomes(tx);

    let (mounted, _rx) = aggregator.mount();
    assert_eq!(next(&mut outcomes).await, PollOutcome::Updated);
    visibility.set_visible(false);

    assert_eq!(next(&mut outcomes).await, PollOutcome::Skipped);
    assert_eq!(next(&mut outcomes).await, PollOutcome::Skipped);
    assert_eq!(service.database_hits(), 1);

    // Becoming visible does not trigger a poll of its own.
    visibility.set_visible(true);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(service.database_hits(), 1);

    assert_eq!(next(&mut outcomes).await, PollOutcome::Updated);
    assert_eq!(service.database_hits(), 2);
    mounted.unmount();
}

#[tokio::test]
async fn unmount_discards_in_flight_poll() {
    let service = healthy_service().await;
    service.update(|d| d.worker_delay = Some(Duration::from_millis(300)));
    let (tx, mut outcomes) = mpsc::unbounded_channel();
    let aggregator =
        StatsAggregator::new(client(&service), Visibility::new(), LONG).report_outcomes(tx);

    let (mounted, rx) = aggregator.mount();
    assert!(common::eventually(Duration::from_secs(1), || service.worker_hits() == 1).await);

    mounted.unmount_and_wait().await;

    assert_eq!(next(&mut outcomes).await, PollOutcome::Discarded);
    assert_eq!(*rx.borrow(), AggregatorState::Loading);
    assert_eq!(service.worker_hits(), 1);
}

#[tokio::test]
async fn unmount_stops_the_interval() {
    let service = healthy_service().await;
    let aggregator =
        StatsAggregator::new(client(&service), Visibility::new(), Duration::from_millis(100));

    let (mounted, _rx) = aggregator.mount();
    assert!(common::eventually(Duration::from_secs(1), || service.database_hits() >= 1).await);
    mounted.unmount_and_wait().await;
    let hits = service.database_hits();

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(service.database_hits(), hits);
}

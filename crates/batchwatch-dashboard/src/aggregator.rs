use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use batchwatch_api::{MetricsClient, TransportError};
use batchwatch_core::{AggregatorState, DashboardViewModel};

use crate::lifecycle::{Mounted, PollOutcome, Visibility};

/// Polls the two stats endpoints and keeps the summary card view-model.
///
/// The aggregator is the only writer of its watch slot. A poll that fails
/// leaves the slot untouched, so the cards keep the last good snapshot (or
/// stay `Loading` if nothing has succeeded yet).
pub struct StatsAggregator {
    client: MetricsClient,
    visibility: Visibility,
    interval: Duration,
    tx: watch::Sender<AggregatorState>,
    outcomes: Option<mpsc::UnboundedSender<PollOutcome>>,
}

impl StatsAggregator {
    pub fn new(client: MetricsClient, visibility: Visibility, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(AggregatorState::Loading);
        Self {
            client,
            visibility,
            interval,
            tx,
            outcomes: None,
        }
    }

    /// Report every poll outcome, including skipped ticks, to `tx`.
    pub fn report_outcomes(mut self, tx: mpsc::UnboundedSender<PollOutcome>) -> Self {
        self.outcomes = Some(tx);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregatorState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> AggregatorState {
        self.tx.borrow().clone()
    }

    /// Fetch both stats concurrently and publish the merged view-model.
    ///
    /// Nothing is published if either request failed or if `token` was
    /// cancelled while the requests were in flight.
    pub async fn poll(&self, token: &CancellationToken) -> PollOutcome {
        let (database, worker) =
            tokio::join!(self.client.database_stats(), self.client.worker_stats());

        if token.is_cancelled() {
            tracing::debug!("Stats poll finished after unmount, discarding result");
            return PollOutcome::Discarded;
        }

        let database = logged("database/stats", database);
        let worker = logged("worker/stats", worker);

        match DashboardViewModel::merge(database, worker) {
            Some(vm) => {
                tracing::trace!(
                    events = vm.database.events.total,
                    batches = vm.database.batches.total,
                    "Stats updated"
                );
                self.tx.send_replace(AggregatorState::Ready(vm));
                PollOutcome::Updated
            },
            None => PollOutcome::Failed,
        }
    }

    /// One scheduled interval firing. Hidden means no request at all.
    pub async fn tick(&self, token: &CancellationToken) -> PollOutcome {
        if !self.visibility.is_visible() {
            tracing::debug!("Dashboard hidden, skipping stats poll");
            return PollOutcome::Skipped;
        }
        self.poll(token).await
    }

    /// Start polling in the background: once now, then every interval.
    pub fn mount(self) -> (Mounted, watch::Receiver<AggregatorState>) {
        let rx = self.subscribe();
        let mounted = Mounted::spawn("stats", move |token| self.run(token));
        (mounted, rx)
    }

    async fn run(self, token: CancellationToken) {
        let start = Instant::now() + self.interval;

        let outcome = self.poll(&token).await;
        self.report(outcome);

        let mut interval = tokio::time::interval_at(start, self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    let outcome = self.tick(&token).await;
                    self.report(outcome);
                },
            }
        }
    }

    fn report(&self, outcome: PollOutcome) {
        if let Some(tx) = &self.outcomes {
            let _ = tx.send(outcome);
        }
    }
}

fn logged<T>(endpoint: &'static str, result: Result<T, TransportError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(endpoint, error = %e, "Stats poll failed");
            None
        },
    }
}

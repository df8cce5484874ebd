use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use batchwatch_api::MetricsClient;
use batchwatch_core::{BatchOrder, BatchSeries};

use crate::lifecycle::{Mounted, PollOutcome};

/// Fetches recent batch history for one chart surface on its own cadence.
///
/// Each successful fetch publishes a fresh [`BatchSeries`], even if the
/// data did not change, so the surface rebuilds its chart every refresh.
pub struct BatchFeed {
    name: &'static str,
    client: MetricsClient,
    limit: u32,
    cadence: Duration,
    order: BatchOrder,
    tx: watch::Sender<BatchSeries>,
    outcomes: Option<mpsc::UnboundedSender<PollOutcome>>,
}

impl BatchFeed {
    pub fn new(name: &'static str, client: MetricsClient, limit: u32, cadence: Duration) -> Self {
        let (tx, _rx) = watch::channel(BatchSeries::default());
        Self {
            name,
            client,
            limit,
            cadence,
            order: BatchOrder::default(),
            tx,
            outcomes: None,
        }
    }

    pub fn with_order(mut self, order: BatchOrder) -> Self {
        self.order = order;
        self
    }

    pub fn report_outcomes(mut self, tx: mpsc::UnboundedSender<PollOutcome>) -> Self {
        self.outcomes = Some(tx);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn subscribe(&self) -> watch::Receiver<BatchSeries> {
        self.tx.subscribe()
    }

    /// Fetch the most recent `limit` batches and publish their series.
    pub async fn refresh(&self, token: &CancellationToken) -> PollOutcome {
        let result = self.client.recent_batches(self.limit).await;

        if token.is_cancelled() {
            tracing::debug!(feed = self.name, "Batch fetch finished after unmount, discarding result");
            return PollOutcome::Discarded;
        }

        match result {
            Ok(batches) => {
                let batches = self.order.apply(batches);
                let series = BatchSeries::from_batches(&batches);
                tracing::trace!(feed = self.name, batches = series.len(), "Batch series updated");
                self.tx.send_replace(series);
                PollOutcome::Updated
            },
            Err(e) => {
                tracing::warn!(
                    feed = self.name,
                    limit = self.limit,
                    error = %e,
                    "Batch history fetch failed"
                );
                PollOutcome::Failed
            },
        }
    }

    pub fn mount(self) -> (Mounted, watch::Receiver<BatchSeries>) {
        let rx = self.subscribe();
        let name = self.name;
        let mounted = Mounted::spawn(name, move |token| self.run(token));
        (mounted, rx)
    }

    async fn run(self, token: CancellationToken) {
        let start = Instant::now() + self.cadence;

        let outcome = self.refresh(&token).await;
        self.report(outcome);

        let mut interval = tokio::time::interval_at(start, self.cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    let outcome = self.refresh(&token).await;
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

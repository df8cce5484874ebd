//! Console monitor: no terminal UI, one log line per stats update.

use tokio::sync::watch;

use batchwatch_api::MetricsClient;
use batchwatch_core::{AggregatorState, DashboardViewModel};

use crate::aggregator::StatsAggregator;
use crate::config::DashboardConfig;
use crate::lifecycle::Visibility;

/// Poll stats until ctrl-c, logging every update.
pub async fn run(config: &DashboardConfig, client: MetricsClient) -> std::io::Result<()> {
    let aggregator = StatsAggregator::new(client, Visibility::new(), config.stats_interval());
    let (mounted, rx) = aggregator.mount();
    tracing::info!(
        interval_secs = config.stats.interval_secs,
        "Monitoring pipeline stats, press ctrl-c to stop"
    );

    let result = tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = follow(rx, config.loading_notice_after()) => Ok(()),
    };

    mounted.unmount();
    tracing::info!("Monitoring stopped");
    result
}

/// Log each published state. Returns when the aggregator goes away.
pub async fn follow(mut rx: watch::Receiver<AggregatorState>, notice_after: std::time::Duration) {
    let notice = tokio::time::sleep(notice_after);
    tokio::pin!(notice);
    let mut noticed = false;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return;
                }
                if let AggregatorState::Ready(vm) = &*rx.borrow_and_update() {
                    log_summary(vm);
                }
            },
            _ = &mut notice, if !noticed => {
                noticed = true;
                if !rx.borrow().is_ready() {
                    tracing::warn!(
                        after_secs = notice_after.as_secs_f64(),
                        "No stats received yet, service unreachable, still retrying"
                    );
                }
            },
        }
    }
}

pub fn log_summary(vm: &DashboardViewModel) {
    let db = &vm.database;
    tracing::info!(
        events = db.events.total,
        processed = db.events.processed,
        batches = db.batches.total,
        total_cost = %format!("${:.4}", db.costs.total),
        worker = vm.worker_label(),
        "Pipeline stats"
    );
}

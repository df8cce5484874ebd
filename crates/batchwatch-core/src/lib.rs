pub mod batch;
pub mod error;
pub mod series;
pub mod stats;
pub mod view_model;

pub use batch::{BatchOrder, BatchRecord};
pub use error::DerivedValueError;
pub use series::{BatchSeries, ChartSeries};
pub use stats::{DatabaseStats, WorkerStats};
pub use view_model::{AggregatorState, DashboardViewModel};

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::batch::BatchRecord;
    use crate::stats::{BatchSummary, CostSummary, DatabaseStats, EventCounts, WorkerStats};

    /// Database stats with `total` events of which `processed` are done.
    pub fn make_database_stats(total: u64, processed: u64) -> DatabaseStats {
        DatabaseStats {
            events: EventCounts {
                total,
                processed,
                unprocessed: total.saturating_sub(processed),
                processing_rate: None,
            },
            batches: BatchSummary {
                total: 2,
                avg_size: 30.0,
                avg_processing_time: 1.25,
                avg_cost: 0.25,
            },
            costs: CostSummary {
                total: 0.5,
                per_event: 0.0083,
            },
        }
    }

    /// Worker stats for a running worker with the ML optimizer enabled.
    pub fn make_worker_stats(ml_predictions_used: u64) -> WorkerStats {
        WorkerStats {
            ml_predictions_used,
            is_running: true,
            ml_enabled: true,
            ..WorkerStats::default()
        }
    }

    /// A completed batch with the given id, size, and cost.
    pub fn make_batch(id: u64, batch_size: u64, processing_cost: f64) -> BatchRecord {
        BatchRecord {
            id,
            batch_size,
            processing_cost,
            processing_time_seconds: Some(1.0),
            started_at: Some("2026-01-01T00:00:00".to_string()),
        }
    }

    /// `n` batches with sequential ids starting at `first_id`.
    pub fn make_batches(first_id: u64, n: usize) -> Vec<BatchRecord> {
        (0..n as u64)
            .map(|i| make_batch(first_id + i, 10 + i * 5, 0.1 + i as f64 * 0.01))
            .collect()
    }
}

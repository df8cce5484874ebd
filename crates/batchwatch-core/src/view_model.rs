use crate::stats::{DatabaseStats, WorkerStats};

/// Render-ready snapshot behind the summary cards.
///
/// Both halves always come from the same poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardViewModel {
    pub database: DatabaseStats,
    pub worker: WorkerStats,
}

impl DashboardViewModel {
    /// Join the two poll results. Ready only when both are present.
    pub fn merge(database: Option<DatabaseStats>, worker: Option<WorkerStats>) -> Option<Self> {
        match (database, worker) {
            (Some(database), Some(worker)) => Some(Self { database, worker }),
            _ => None,
        }
    }

    /// Share of ingested events already processed, in percent.
    pub fn processed_percent(&self) -> f64 {
        let events = &self.database.events;
        if events.total == 0 {
            return 0.0;
        }
        events.processed as f64 / events.total as f64 * 100.0
    }

    /// Upstream processing rate string, or one computed from the counters.
    pub fn processing_rate_label(&self) -> String {
        match &self.database.events.processing_rate {
            Some(rate) => rate.clone(),
            None => format!("{:.1}%", self.processed_percent()),
        }
    }

    pub fn worker_label(&self) -> &'static str {
        if self.worker.is_running {
            "running"
        } else {
            "stopped"
        }
    }

    pub fn ml_label(&self) -> &'static str {
        if self.worker.ml_enabled {
            "ML optimizer"
        } else {
            "fixed batch size"
        }
    }
}

/// Lifecycle of the summary cards.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AggregatorState {
    /// No poll has produced a complete snapshot yet.
    #[default]
    Loading,
    Ready(DashboardViewModel),
}

impl AggregatorState {
    pub fn is_ready(&self) -> bool {
        matches!(self, AggregatorState::Ready(_))
    }

    pub fn view_model(&self) -> Option<&DashboardViewModel> {
        match self {
            AggregatorState::Ready(vm) => Some(vm),
            AggregatorState::Loading => None,
        }
    }
}

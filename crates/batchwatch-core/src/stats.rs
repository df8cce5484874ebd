use serde::{Deserialize, Serialize};

/// Event counters reported by `GET /database/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventCounts {
    pub total: u64,
    pub processed: u64,
    pub unprocessed: u64,
    /// Preformatted percentage, e.g. `"42.5%"`.
    #[serde(default)]
    pub processing_rate: Option<String>,
}

/// Batch aggregates reported by `GET /database/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: u64,
    #[serde(default)]
    pub avg_size: f64,
    #[serde(default)]
    pub avg_processing_time: f64,
    #[serde(default)]
    pub avg_cost: f64,
}

/// Cost totals reported by `GET /database/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub total: f64,
    #[serde(default)]
    pub per_event: f64,
}

/// Aggregate counters from the pipeline database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub events: EventCounts,
    pub batches: BatchSummary,
    pub costs: CostSummary,
}

/// Background worker state reported by `GET /worker/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerStats {
    #[serde(default)]
    pub ml_predictions_used: u64,
    pub is_running: bool,
    #[serde(default)]
    pub ml_enabled: bool,
    #[serde(default)]
    pub total_batches_processed: u64,
    #[serde(default)]
    pub total_events_processed: u64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub runtime_seconds: Option<f64>,
    #[serde(default)]
    pub runtime_formatted: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub last_batch_at: Option<String>,
}

/// Health check payload served at `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub worker_running: bool,
}

/// Event simulator state served at `GET /simulator/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatorStatus {
    pub running: bool,
    #[serde(default)]
    pub events_generated: u64,
}

/// Acknowledgement returned by `POST /simulator/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorAck {
    #[serde(default)]
    pub message: String,
}

use serde::{Deserialize, Serialize};

/// One completed batch as returned by `GET /batches/recent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: u64,
    pub batch_size: u64,
    pub processing_cost: f64,
    #[serde(default)]
    pub processing_time_seconds: Option<f64>,
    #[serde(default)]
    pub started_at: Option<String>,
}

impl BatchRecord {
    /// Chart category label for this batch. Depends on `id` only.
    pub fn label(&self) -> String {
        format!("Batch {}", self.id)
    }
}

/// How the client orders the batch history it receives.
///
/// The service decides what "recent" means; the client never sorts by id or
/// timestamp, it only keeps or flips the sequence it was given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOrder {
    #[default]
    AsReturned,
    Reversed,
}

impl BatchOrder {
    /// Apply the ordering to a freshly fetched sequence.
    pub fn apply(self, mut batches: Vec<BatchRecord>) -> Vec<BatchRecord> {
        if self == BatchOrder::Reversed {
            batches.reverse();
        }
        batches
    }
}

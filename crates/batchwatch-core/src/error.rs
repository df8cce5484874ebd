/// Failure computing a value derived from upstream fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DerivedValueError {
    /// Cost per event requested for a batch with no events.
    #[error("batch {batch_id} has batch_size 0; cost per event is undefined")]
    EmptyBatch { batch_id: u64 },
}

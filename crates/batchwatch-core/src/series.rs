use crate::batch::BatchRecord;
use crate::error::DerivedValueError;

/// Value placed in the efficiency series where cost per event is undefined.
pub const EFFICIENCY_GAP: f64 = f64::NAN;

/// Scale applied to cost per event for display (currency unit -> cents).
const EFFICIENCY_SCALE: f64 = 1000.0;

/// Ordered chart series. `labels[i]` describes `values[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Contiguous runs of defined values as `(index, value)` points.
    ///
    /// A gap ends the current run, so a line drawn per run breaks there.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut runs = Vec::new();
        let mut current = Vec::new();
        for (i, v) in self.values.iter().enumerate() {
            if v.is_finite() {
                current.push((i as f64, *v));
            } else if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }

    /// Min and max over defined values, or `None` if every value is a gap.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// The three index-aligned series derived from one batch history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSeries {
    pub labels: Vec<String>,
    pub batch_size: Vec<f64>,
    pub cost: Vec<f64>,
    pub efficiency: Vec<f64>,
}

impl BatchSeries {
    /// Build all three series from a batch history, in the order given.
    ///
    /// Pure: no state survives between calls. A zero `batch_size` puts
    /// [`EFFICIENCY_GAP`] at that index and leaves every other index intact.
    pub fn from_batches(batches: &[BatchRecord]) -> Self {
        let mut series = BatchSeries {
            labels: Vec::with_capacity(batches.len()),
            batch_size: Vec::with_capacity(batches.len()),
            cost: Vec::with_capacity(batches.len()),
            efficiency: Vec::with_capacity(batches.len()),
        };
        for batch in batches {
            series.labels.push(batch.label());
            series.batch_size.push(batch.batch_size as f64);
            series.cost.push(batch.processing_cost);
            series
                .efficiency
                .push(cost_per_event_cents(batch).unwrap_or(EFFICIENCY_GAP));
        }
        series
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn batch_size_series(&self) -> ChartSeries {
        self.series(&self.batch_size)
    }

    pub fn cost_series(&self) -> ChartSeries {
        self.series(&self.cost)
    }

    pub fn efficiency_series(&self) -> ChartSeries {
        self.series(&self.efficiency)
    }

    fn series(&self, values: &[f64]) -> ChartSeries {
        ChartSeries {
            labels: self.labels.clone(),
            values: values.to_vec(),
        }
    }
}

/// Cost per event of one batch, in cents.
pub fn cost_per_event_cents(batch: &BatchRecord) -> Result<f64, DerivedValueError> {
    if batch.batch_size == 0 {
        return Err(DerivedValueError::EmptyBatch { batch_id: batch.id });
    }
    Ok(batch.processing_cost / batch.batch_size as f64 * EFFICIENCY_SCALE)
}

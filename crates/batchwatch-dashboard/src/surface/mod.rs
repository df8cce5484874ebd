//! Chart surfaces: a mounted region that owns at most one chart instance.

pub mod terminal;

use batchwatch_core::{BatchSeries, ChartSeries};

pub use terminal::{TerminalBackend, TerminalChart};

/// Which axis a series is plotted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSide {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStyle {
    Line,
    Bar,
}

/// One series to draw. `data` is index-aligned with [`ChartSpec::labels`];
/// NaN marks a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSpec {
    pub name: &'static str,
    pub style: SeriesStyle,
    pub axis: AxisSide,
    pub data: ChartSeries,
}

/// Everything a backend needs to build a chart instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: &'static str,
    pub labels: Vec<String>,
    pub series: Vec<SeriesSpec>,
}

/// Builds and releases chart instances.
///
/// `destroy` must release everything `create` acquired. Surfaces always
/// destroy the previous instance before creating the next one.
pub trait ChartBackend {
    type Instance;

    fn create(&mut self, spec: &ChartSpec) -> Self::Instance;
    fn destroy(&mut self, instance: Self::Instance);
}

/// The two charts on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Processing cost per batch, single line.
    CostTrend,
    /// Batch size bars with cost per event on a secondary axis.
    BatchEfficiency,
}

impl SurfaceKind {
    pub fn name(self) -> &'static str {
        match self {
            SurfaceKind::CostTrend => "cost_trend",
            SurfaceKind::BatchEfficiency => "efficiency",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SurfaceKind::CostTrend => "Cost per Batch",
            SurfaceKind::BatchEfficiency => "Batch Size vs Cost Efficiency",
        }
    }

    pub fn spec(self, series: &BatchSeries) -> ChartSpec {
        let series_specs = match self {
            SurfaceKind::CostTrend => vec![SeriesSpec {
                name: "Processing cost ($)",
                style: SeriesStyle::Line,
                axis: AxisSide::Primary,
                data: series.cost_series(),
            }],
            SurfaceKind::BatchEfficiency => vec![
                SeriesSpec {
                    name: "Batch size",
                    style: SeriesStyle::Bar,
                    axis: AxisSide::Primary,
                    data: series.batch_size_series(),
                },
                SeriesSpec {
                    name: "Cost per event (cents)",
                    style: SeriesStyle::Line,
                    axis: AxisSide::Secondary,
                    data: series.efficiency_series(),
                },
            ],
        };
        ChartSpec {
            title: self.title(),
            labels: series.labels.clone(),
            series: series_specs,
        }
    }
}

/// A chart region with a single owned instance.
pub struct ChartSurface<B: ChartBackend> {
    kind: SurfaceKind,
    backend: B,
    instance: Option<B::Instance>,
    generation: u64,
}

impl<B: ChartBackend> ChartSurface<B> {
    pub fn new(kind: SurfaceKind, backend: B) -> Self {
        Self {
            kind,
            backend,
            instance: None,
            generation: 0,
        }
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    /// Replace the chart with one built from `series`.
    ///
    /// The old instance is destroyed first. Empty labels leave the surface
    /// blank.
    pub fn refresh(&mut self, series: &BatchSeries) {
        self.release();
        if series.is_empty() {
            tracing::trace!(surface = self.kind.name(), "No batches, surface left blank");
            return;
        }
        let spec = self.kind.spec(series);
        self.instance = Some(self.backend.create(&spec));
        self.generation += 1;
        tracing::trace!(
            surface = self.kind.name(),
            generation = self.generation,
            points = series.len(),
            "Chart rebuilt"
        );
    }

    pub fn instance(&self) -> Option<&B::Instance> {
        self.instance.as_ref()
    }

    /// Number of instances built so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Destroy the current instance, if any.
    pub fn unmount(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(old) = self.instance.take() {
            self.backend.destroy(old);
        }
    }
}

impl<B: ChartBackend> Drop for ChartSurface<B> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use batchwatch_core::BatchRecord;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(u64),
        Destroy(u64),
    }

    #[derive(Default, Clone)]
    struct Recording {
        calls: Rc<RefCell<Vec<Call>>>,
        live: Rc<RefCell<u64>>,
        next: u64,
    }

    impl ChartBackend for Recording {
        type Instance = (u64, ChartSpec);

        fn create(&mut self, spec: &ChartSpec) -> Self::Instance {
            self.next += 1;
            *self.live.borrow_mut() += 1;
            assert_eq!(*self.live.borrow(), 1, "two live instances");
            self.calls.borrow_mut().push(Call::Create(self.next));
            (self.next, spec.clone())
        }

        fn destroy(&mut self, instance: Self::Instance) {
            *self.live.borrow_mut() -= 1;
            self.calls.borrow_mut().push(Call::Destroy(instance.0));
        }
    }

    fn series(ids: &[u64]) -> BatchSeries {
        let batches: Vec<BatchRecord> = ids
            .iter()
            .map(|&id| BatchRecord {
                id,
                batch_size: id * 10,
                processing_cost: id as f64 * 0.1,
                processing_time_seconds: None,
                started_at: None,
            })
            .collect();
        BatchSeries::from_batches(&batches)
    }

    #[test]
    fn refresh_destroys_before_creating() {
        let backend = Recording::default();
        let calls = Rc::clone(&backend.calls);
        let mut surface = ChartSurface::new(SurfaceKind::CostTrend, backend);

        surface.refresh(&series(&[1, 2]));
        surface.refresh(&series(&[3]));
        surface.refresh(&series(&[4, 5, 6]));

        assert_eq!(
            *calls.borrow(),
            vec![
                Call::Create(1),
                Call::Destroy(1),
                Call::Create(2),
                Call::Destroy(2),
                Call::Create(3),
            ]
        );
        assert_eq!(surface.generation(), 3);
    }

    #[test]
    fn after_n_refreshes_one_instance_reflects_last_data() {
        let backend = Recording::default();
        let live = Rc::clone(&backend.live);
        let mut surface = ChartSurface::new(SurfaceKind::CostTrend, backend);

        for n in 1..=10u64 {
            surface.refresh(&series(&[n, n + 1]));
        }

        assert_eq!(*live.borrow(), 1);
        let (_, spec) = surface.instance().unwrap();
        assert_eq!(spec.labels, vec!["Batch 10", "Batch 11"]);
    }

    #[test]
    fn empty_series_leaves_surface_blank() {
        let backend = Recording::default();
        let live = Rc::clone(&backend.live);
        let mut surface = ChartSurface::new(SurfaceKind::BatchEfficiency, backend);

        surface.refresh(&series(&[1]));
        surface.refresh(&BatchSeries::default());

        assert!(surface.instance().is_none());
        assert_eq!(*live.borrow(), 0);
        assert_eq!(surface.generation(), 1);
    }

    #[test]
    fn drop_destroys_instance() {
        let backend = Recording::default();
        let live = Rc::clone(&backend.live);
        {
            let mut surface = ChartSurface::new(SurfaceKind::CostTrend, backend);
            surface.refresh(&series(&[1]));
            assert_eq!(*live.borrow(), 1);
        }
        assert_eq!(*live.borrow(), 0);
    }

    #[test]
    fn efficiency_spec_puts_line_on_secondary_axis() {
        let spec = SurfaceKind::BatchEfficiency.spec(&series(&[1, 2]));
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[0].style, SeriesStyle::Bar);
        assert_eq!(spec.series[0].axis, AxisSide::Primary);
        assert_eq!(spec.series[1].style, SeriesStyle::Line);
        assert_eq!(spec.series[1].axis, AxisSide::Secondary);
        assert_eq!(spec.series[1].data.len(), spec.labels.len());
        assert_eq!(spec.series[1].data.labels, spec.labels);
    }

    #[test]
    fn cost_trend_spec_is_single_line() {
        let data = series(&[1, 2, 3]);
        let spec = SurfaceKind::CostTrend.spec(&data);
        assert_eq!(spec.series.len(), 1);
        assert_eq!(spec.series[0].style, SeriesStyle::Line);
        assert_eq!(spec.series[0].data.values, data.cost);
    }
}

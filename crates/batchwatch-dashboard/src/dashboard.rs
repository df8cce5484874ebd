use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use batchwatch_api::MetricsClient;
use batchwatch_core::{AggregatorState, BatchSeries};

use crate::aggregator::StatsAggregator;
use crate::config::DashboardConfig;
use crate::feed::BatchFeed;
use crate::lifecycle::{Mounted, Visibility};
use crate::surface::{ChartBackend, ChartSurface, SurfaceKind};

/// A chart surface together with the feed that drives it.
pub struct MountedSurface<B: ChartBackend> {
    surface: ChartSurface<B>,
    rx: watch::Receiver<BatchSeries>,
    guard: Mounted,
}

impl<B: ChartBackend> MountedSurface<B> {
    fn mount(kind: SurfaceKind, backend: B, feed: BatchFeed) -> Self {
        let (guard, rx) = feed.mount();
        Self {
            surface: ChartSurface::new(kind, backend),
            rx,
            guard,
        }
    }

    /// Rebuild the chart if the feed published since the last sync.
    fn sync(&mut self) -> bool {
        if !self.rx.has_changed().unwrap_or(false) {
            return false;
        }
        self.rebuild();
        true
    }

    fn rebuild(&mut self) {
        let series = self.rx.borrow_and_update().clone();
        self.surface.refresh(&series);
    }

    pub fn surface(&self) -> &ChartSurface<B> {
        &self.surface
    }

    fn unmount(mut self) {
        self.guard.unmount();
        self.surface.unmount();
    }
}

/// Composition root: the stats cards and both chart surfaces.
///
/// Owns every mount guard. The parts share nothing except the client they
/// were built with and the visibility flag.
pub struct Dashboard<B: ChartBackend> {
    visibility: Visibility,
    stats: watch::Receiver<AggregatorState>,
    stats_guard: Mounted,
    cost_trend: MountedSurface<B>,
    efficiency: MountedSurface<B>,
    mounted_at: Instant,
    loading_notice_after: Duration,
}

impl<B: ChartBackend> Dashboard<B> {
    /// Mount everything. Must be called inside a tokio runtime.
    pub fn mount(
        config: &DashboardConfig,
        client: MetricsClient,
        mut backend: impl FnMut(SurfaceKind) -> B,
    ) -> Self {
        let visibility = Visibility::new();

        let aggregator =
            StatsAggregator::new(client.clone(), visibility.clone(), config.stats_interval());
        let (stats_guard, stats) = aggregator.mount();

        let cost_feed = BatchFeed::new(
            SurfaceKind::CostTrend.name(),
            client.clone(),
            config.cost_trend.limit,
            config.cost_trend_cadence(),
        )
        .with_order(config.batches.order);
        let efficiency_feed = BatchFeed::new(
            SurfaceKind::BatchEfficiency.name(),
            client,
            config.efficiency.limit,
            config.efficiency_cadence(),
        )
        .with_order(config.batches.order);

        let cost_trend = MountedSurface::mount(
            SurfaceKind::CostTrend,
            backend(SurfaceKind::CostTrend),
            cost_feed,
        );
        let efficiency = MountedSurface::mount(
            SurfaceKind::BatchEfficiency,
            backend(SurfaceKind::BatchEfficiency),
            efficiency_feed,
        );

        tracing::info!("Dashboard mounted");
        Self {
            visibility,
            stats,
            stats_guard,
            cost_trend,
            efficiency,
            mounted_at: Instant::now(),
            loading_notice_after: config.loading_notice_after(),
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.visibility.set_visible(visible);
    }

    pub fn stats(&self) -> AggregatorState {
        self.stats.borrow().clone()
    }

    /// True once the cards have been loading for longer than the configured notice delay.
    pub fn show_unreachable_notice(&self) -> bool {
        !self.stats.borrow().is_ready() && self.mounted_at.elapsed() >= self.loading_notice_after
    }

    pub fn cost_trend(&self) -> &ChartSurface<B> {
        self.cost_trend.surface()
    }

    pub fn efficiency(&self) -> &ChartSurface<B> {
        self.efficiency.surface()
    }

    /// Apply any batch series published since the last call.
    pub fn sync_surfaces(&mut self) -> bool {
        let cost = self.cost_trend.sync();
        let efficiency = self.efficiency.sync();
        cost || efficiency
    }

    /// Wait until the stats or either feed publishes.
    ///
    /// Surfaces are rebuilt before returning. `false` means a poller has
    /// stopped and nothing more will arrive from it.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            res = self.stats.changed() => res.is_ok(),
            res = self.cost_trend.rx.changed() => {
                if res.is_ok() {
                    self.cost_trend.rebuild();
                }
                res.is_ok()
            },
            res = self.efficiency.rx.changed() => {
                if res.is_ok() {
                    self.efficiency.rebuild();
                }
                res.is_ok()
            },
        }
    }

    /// Tear down all pollers and destroy both chart instances.
    pub fn unmount(self) {
        let Self {
            stats_guard,
            cost_trend,
            efficiency,
            ..
        } = self;
        stats_guard.unmount();
        cost_trend.unmount();
        efficiency.unmount();
        tracing::info!("Dashboard unmounted");
    }
}

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use batchwatch_api::MetricsClient;
use batchwatch_api::mock::{MockData, MockService};
use batchwatch_core::test_helpers::{make_batches, make_database_stats, make_worker_stats};
use batchwatch_dashboard::config::DashboardConfig;
use batchwatch_dashboard::surface::{ChartBackend, ChartSpec};

/// Counts live chart instances and fails the test if a second one is created.
#[derive(Clone, Default)]
pub struct CountingBackend {
    pub live: Rc<Cell<usize>>,
    pub created: Rc<Cell<usize>>,
    pub destroyed: Rc<Cell<usize>>,
    pub last_labels: Rc<RefCell<Vec<String>>>,
}

impl ChartBackend for CountingBackend {
    type Instance = Vec<String>;

    fn create(&mut self, spec: &ChartSpec) -> Vec<String> {
        assert_eq!(self.live.get(), 0, "created a chart while another was live");
        self.live.set(1);
        self.created.set(self.created.get() + 1);
        *self.last_labels.borrow_mut() = spec.labels.clone();
        spec.labels.clone()
    }

    fn destroy(&mut self, _instance: Vec<String>) {
        self.live.set(self.live.get() - 1);
        self.destroyed.set(self.destroyed.get() + 1);
    }
}

pub async fn healthy_service() -> MockService {
    MockService::start(MockData {
        database: Some(make_database_stats(120, 100)),
        worker: Some(make_worker_stats(3)),
        batches: make_batches(1, 25),
        ..MockData::default()
    })
    .await
}

pub fn client(service: &MockService) -> MetricsClient {
    MetricsClient::new(&service.api_config()).unwrap()
}

/// Dashboard config pointed at `service` with sub-second cadences.
pub fn fast_config(service: &MockService) -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.api = service.api_config();
    config.stats.interval_secs = 0.2;
    config.stats.loading_notice_after_secs = 0.3;
    config.cost_trend.refresh_secs = 0.25;
    config.efficiency.refresh_secs = 0.35;
    config
}

/// Poll `check` every 10ms until it holds or `timeout` passes.
pub async fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

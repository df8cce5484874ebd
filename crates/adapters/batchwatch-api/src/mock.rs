//! In-process stand-in for the pipeline service, for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use batchwatch_core::batch::BatchRecord;
use batchwatch_core::stats::{
    DatabaseStats, ServiceHealth, SimulatorAck, SimulatorStatus, WorkerStats,
};

use crate::config::ApiConfig;

/// What each endpoint currently serves. `None` answers 500.
#[derive(Debug, Clone, Default)]
pub struct MockData {
    pub database: Option<DatabaseStats>,
    pub worker: Option<WorkerStats>,
    pub batches: Vec<BatchRecord>,
    pub simulator_running: bool,
    /// Serve a body that is valid JSON but not the expected shape.
    pub malformed: bool,
    /// Hold `/worker/stats` responses for this long.
    pub worker_delay: Option<Duration>,
}

/// Per-endpoint request counters.
#[derive(Debug, Default)]
struct MockHits {
    database: AtomicUsize,
    worker: AtomicUsize,
    batches: AtomicUsize,
    simulator_start: AtomicUsize,
}

#[derive(Clone, Default)]
struct MockState {
    data: Arc<Mutex<MockData>>,
    hits: Arc<MockHits>,
    last_limit: Arc<Mutex<Option<u32>>>,
}

/// A running mock service bound to an ephemeral localhost port.
pub struct MockService {
    pub addr: SocketAddr,
    state: MockState,
    _server: tokio::task::JoinHandle<()>,
}

impl MockService {
    pub async fn start(data: MockData) -> Self {
        let state = MockState {
            data: Arc::new(Mutex::new(data)),
            ..MockState::default()
        };
        let app = Router::new()
            .route("/", axum::routing::get(health))
            .route("/database/stats", axum::routing::get(database_stats))
            .route("/worker/stats", axum::routing::get(worker_stats))
            .route("/batches/recent", axum::routing::get(recent_batches))
            .route("/simulator/start", axum::routing::post(start_simulator))
            .route("/simulator/status", axum::routing::get(simulator_status))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock service");
        let addr = listener.local_addr().expect("mock service address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            _server: server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url(),
            ..ApiConfig::default()
        }
    }

    /// Mutate what the service returns from now on.
    pub fn update(&self, f: impl FnOnce(&mut MockData)) {
        f(&mut lock(&self.state.data));
    }

    pub fn database_hits(&self) -> usize {
        self.state.hits.database.load(Ordering::SeqCst)
    }

    pub fn worker_hits(&self) -> usize {
        self.state.hits.worker.load(Ordering::SeqCst)
    }

    pub fn batch_hits(&self) -> usize {
        self.state.hits.batches.load(Ordering::SeqCst)
    }

    pub fn simulator_start_hits(&self) -> usize {
        self.state.hits.simulator_start.load(Ordering::SeqCst)
    }

    /// `limit` query parameter of the most recent batch request.
    pub fn last_limit(&self) -> Option<u32> {
        *lock(&self.state.last_limit)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn unavailable() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "detail": "unavailable" })),
    )
        .into_response()
}

fn malformed() -> Response {
    Json(serde_json::json!({ "unexpected": true })).into_response()
}

async fn health(State(state): State<MockState>) -> Json<ServiceHealth> {
    let running = lock(&state.data)
        .worker
        .as_ref()
        .is_some_and(|w| w.is_running);
    Json(ServiceHealth {
        status: "running".to_string(),
        service: "data_pipeline API".to_string(),
        version: "1.0".to_string(),
        worker_running: running,
    })
}

async fn database_stats(State(state): State<MockState>) -> Response {
    state.hits.database.fetch_add(1, Ordering::SeqCst);
    let data = lock(&state.data).clone();
    if data.malformed {
        return malformed();
    }
    match data.database {
        Some(stats) => Json(stats).into_response(),
        None => unavailable(),
    }
}

async fn worker_stats(State(state): State<MockState>) -> Response {
    state.hits.worker.fetch_add(1, Ordering::SeqCst);
    let data = lock(&state.data).clone();
    if let Some(delay) = data.worker_delay {
        tokio::time::sleep(delay).await;
    }
    if data.malformed {
        return malformed();
    }
    match data.worker {
        Some(stats) => Json(stats).into_response(),
        None => unavailable(),
    }
}

#[derive(Deserialize)]
struct LimitParams {
    limit: Option<u32>,
}

async fn recent_batches(
    State(state): State<MockState>,
    Query(params): Query<LimitParams>,
) -> Response {
    state.hits.batches.fetch_add(1, Ordering::SeqCst);
    *lock(&state.last_limit) = params.limit;
    let data = lock(&state.data).clone();
    if data.malformed {
        return malformed();
    }
    let limit = params.limit.unwrap_or(10) as usize;
    let batches: Vec<BatchRecord> = data.batches.into_iter().take(limit).collect();
    Json(batches).into_response()
}

async fn start_simulator(State(state): State<MockState>) -> Json<SimulatorAck> {
    state.hits.simulator_start.fetch_add(1, Ordering::SeqCst);
    let mut data = lock(&state.data);
    let message = if data.simulator_running {
        "simulator already running"
    } else {
        data.simulator_running = true;
        "Event simulator started"
    };
    Json(SimulatorAck {
        message: message.to_string(),
    })
}

async fn simulator_status(State(state): State<MockState>) -> Json<SimulatorStatus> {
    let data = lock(&state.data);
    Json(SimulatorStatus {
        running: data.simulator_running,
        events_generated: data.database.as_ref().map_or(0, |d| d.events.total),
    })
}

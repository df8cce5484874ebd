use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use batchwatch_core::batch::BatchRecord;
use batchwatch_core::stats::{
    DatabaseStats, ServiceHealth, SimulatorAck, SimulatorStatus, WorkerStats,
};

use crate::config::ApiConfig;
use crate::error::TransportError;

/// Typed wrapper over the pipeline service's monitoring endpoints.
///
/// Holds no per-call state, so clones can be handed to every poller and
/// used concurrently. No retries: a failed call is reported once and the
/// caller decides what to keep.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    client: reqwest::Client,
    base: Url,
}

impl MetricsClient {
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let base = parse_base_url(&config.base_url)?;
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(TransportError::ClientBuild)?;
        Ok(Self { client, base })
    }

    /// Service root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub async fn database_stats(&self) -> Result<DatabaseStats, TransportError> {
        self.get_json("database/stats", &[]).await
    }

    pub async fn worker_stats(&self) -> Result<WorkerStats, TransportError> {
        self.get_json("worker/stats", &[]).await
    }

    /// Up to `limit` recent completed batches, in the order the service sends them.
    pub async fn recent_batches(&self, limit: u32) -> Result<Vec<BatchRecord>, TransportError> {
        if limit == 0 {
            return Err(TransportError::InvalidLimit);
        }
        self.get_json("batches/recent", &[("limit", limit.to_string())])
            .await
    }

    /// Ask the service to start its event simulator. No body is sent.
    pub async fn start_simulator(&self) -> Result<SimulatorAck, TransportError> {
        let url = self.endpoint("simulator/start")?;
        tracing::debug!(%url, "POST");
        let resp = self
            .client
            .post(url.clone())
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        decode(url, resp).await
    }

    pub async fn health(&self) -> Result<ServiceHealth, TransportError> {
        self.get_json("", &[]).await
    }

    pub async fn simulator_status(&self) -> Result<SimulatorStatus, TransportError> {
        self.get_json("simulator/status", &[]).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TransportError> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        tracing::trace!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        decode(url, resp).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path)
            .map_err(|source| TransportError::InvalidUrl {
                url: format!("{}{path}", self.base),
                source,
            })
    }
}

async fn decode<T: DeserializeOwned>(url: Url, resp: reqwest::Response) -> Result<T, TransportError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            url: url.to_string(),
            status,
        });
    }
    resp.json::<T>()
        .await
        .map_err(|source| TransportError::Decode {
            url: url.to_string(),
            source,
        })
}

/// Parse the configured root, forcing a trailing slash so relative joins
/// append to the path instead of replacing its last segment.
fn parse_base_url(raw: &str) -> Result<Url, TransportError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|source| TransportError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

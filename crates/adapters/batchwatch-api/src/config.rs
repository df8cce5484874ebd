use serde::Deserialize;

/// Connection settings for the pipeline service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root URL of the service, e.g. `http://localhost:8000`.
    pub base_url: String,
    pub user_agent: String,
    /// Per-request timeout. `None` leaves the transport default in place.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            user_agent: concat!("batchwatch/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_service() {
        let cfg = ApiConfig::default();
        assert_eq!(cfg.base_url, "http://localhost:8000");
        assert!(cfg.user_agent.starts_with("batchwatch/"));
        assert!(cfg.request_timeout_secs.is_none());
    }
}

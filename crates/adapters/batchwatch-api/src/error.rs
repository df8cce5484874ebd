/// A request to the pipeline service that did not produce the expected value.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid service url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    ClientBuild(reqwest::Error),
    /// Connection refused, reset, timed out, or otherwise never completed.
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    /// Body was not the expected JSON shape.
    #[error("unexpected response body from {url}: {source}")]
    Decode { url: String, source: reqwest::Error },
    #[error("batch limit must be positive")]
    InvalidLimit,
}

impl TransportError {
    /// HTTP status for `Status` failures.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

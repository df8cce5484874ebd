pub mod client;
pub mod config;
pub mod error;
#[cfg(feature = "mock-service")]
pub mod mock;

pub use client::MetricsClient;
pub use config::ApiConfig;
pub use error::TransportError;

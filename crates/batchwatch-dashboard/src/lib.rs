pub mod aggregator;
pub mod config;
pub mod dashboard;
pub mod feed;
pub mod headless;
pub mod lifecycle;
pub mod logging;
pub mod surface;
pub mod tui;
pub mod ui;

pub use aggregator::StatsAggregator;
pub use config::{ConfigError, ConfigSource, DashboardConfig};
pub use dashboard::Dashboard;
pub use feed::BatchFeed;
pub use lifecycle::{Mounted, PollOutcome, Visibility};
pub use surface::{ChartBackend, ChartSurface, SurfaceKind};

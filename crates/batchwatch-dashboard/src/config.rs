use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use batchwatch_api::ApiConfig;
use batchwatch_core::batch::BatchOrder;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "batchwatch.toml";

/// Top-level dashboard configuration, loaded from `batchwatch.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api: ApiConfig,
    pub stats: StatsConfig,
    pub cost_trend: CostTrendConfig,
    pub efficiency: EfficiencyConfig,
    pub batches: BatchesConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

/// Summary card polling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub interval_secs: f64,
    /// How long the cards may sit in `Loading` before an unreachable notice is shown.
    pub loading_notice_after_secs: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5.0,
            loading_notice_after_secs: 30.0,
        }
    }
}

/// Cost-per-batch trend chart.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CostTrendConfig {
    pub limit: u32,
    pub refresh_secs: f64,
}

impl Default for CostTrendConfig {
    fn default() -> Self {
        Self {
            limit: 20,
            refresh_secs: 10.0,
        }
    }
}

/// Batch size / cost efficiency chart.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EfficiencyConfig {
    pub limit: u32,
    pub refresh_secs: f64,
}

impl Default for EfficiencyConfig {
    fn default() -> Self {
        Self {
            limit: 15,
            refresh_secs: 15.0,
        }
    }
}

/// How fetched batch history is ordered for display.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BatchesConfig {
    pub order: BatchOrder,
}

/// Terminal UI behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub redraw_ms: u64,
    /// Bind `s` to the start-simulator command.
    pub simulator_key_enabled: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            redraw_ms: 250,
            simulator_key_enabled: false,
        }
    }
}

/// Where the terminal UI writes its log file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "batchwatch.log".to_string(),
        }
    }
}

/// Rejected configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("api.base_url {url:?} is not a valid url: {source}")]
    BaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("{0} must be > 0")]
    NotPositive(&'static str),
    #[error("{name} = {value} is too large to use as a duration")]
    OutOfRange { name: &'static str, value: f64 },
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file at this path; built-in defaults were used.
    Defaults(PathBuf),
}

impl ConfigSource {
    /// Report the source. Called once a subscriber is installed.
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => {
                tracing::info!(path = %path.display(), "Loaded configuration");
            },
            ConfigSource::Defaults(path) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
            },
        }
    }
}

impl DashboardConfig {
    /// Load from `path` if it exists, then apply environment overrides.
    ///
    /// A missing file yields defaults; a file that does not parse is an error.
    /// Nothing is logged here since logging is configured from the result.
    pub fn load(path: &Path) -> Result<(Self, ConfigSource), ConfigError> {
        let (mut config, source) = match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg = toml::from_str::<DashboardConfig>(&content).map_err(|source| {
                    ConfigError::Parse {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                (cfg, ConfigSource::File(path.to_path_buf()))
            },
            Err(_) => (
                DashboardConfig::default(),
                ConfigSource::Defaults(path.to_path_buf()),
            ),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok((config, source))
    }

    /// Apply `BATCHWATCH_*` overrides from `lookup` (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("BATCHWATCH_API_URL")
            && !url.is_empty()
        {
            self.api.base_url = url;
        }
        if let Some(val) = lookup("BATCHWATCH_STATS_INTERVAL_SECS")
            && let Ok(secs) = val.parse::<f64>()
        {
            self.stats.interval_secs = secs;
        }
        if let Some(dir) = lookup("BATCHWATCH_LOG_DIR")
            && !dir.is_empty()
        {
            self.logging.directory = PathBuf::from(dir);
        }
        if let Some(val) = lookup("BATCHWATCH_SIMULATOR_KEY")
            && let Ok(enabled) = val.parse::<bool>()
        {
            self.ui.simulator_key_enabled = enabled;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(source) = url::Url::parse(&self.api.base_url) {
            return Err(ConfigError::BaseUrl {
                url: self.api.base_url.clone(),
                source,
            });
        }
        if self.api.request_timeout_secs == Some(0) {
            return Err(ConfigError::NotPositive("api.request_timeout_secs"));
        }
        positive_secs(self.stats.interval_secs, "stats.interval_secs")?;
        positive_secs(self.cost_trend.refresh_secs, "cost_trend.refresh_secs")?;
        positive_secs(self.efficiency.refresh_secs, "efficiency.refresh_secs")?;
        if self.cost_trend.limit == 0 {
            return Err(ConfigError::NotPositive("cost_trend.limit"));
        }
        if self.efficiency.limit == 0 {
            return Err(ConfigError::NotPositive("efficiency.limit"));
        }
        if self.ui.redraw_ms == 0 {
            return Err(ConfigError::NotPositive("ui.redraw_ms"));
        }
        let notice = self.stats.loading_notice_after_secs;
        if !(notice >= 0.0 && notice.is_finite()) {
            return Err(ConfigError::NotPositive("stats.loading_notice_after_secs"));
        }
        fits_duration(notice, "stats.loading_notice_after_secs")?;
        Ok(())
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs_f64(self.stats.interval_secs)
    }

    pub fn loading_notice_after(&self) -> Duration {
        Duration::from_secs_f64(self.stats.loading_notice_after_secs)
    }

    pub fn cost_trend_cadence(&self) -> Duration {
        Duration::from_secs_f64(self.cost_trend.refresh_secs)
    }

    pub fn efficiency_cadence(&self) -> Duration {
        Duration::from_secs_f64(self.efficiency.refresh_secs)
    }

    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.ui.redraw_ms)
    }
}

// NaN fails this check as well.
fn positive_secs(value: f64, name: &'static str) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        fits_duration(value, name)
    } else {
        Err(ConfigError::NotPositive(name))
    }
}

// The duration accessors rely on this to never panic.
fn fits_duration(value: f64, name: &'static str) -> Result<(), ConfigError> {
    match Duration::try_from_secs_f64(value) {
        Ok(_) => Ok(()),
        Err(_) => Err(ConfigError::OutOfRange { name, value }),
    }
}

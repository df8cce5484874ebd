//! Tracing subscriber setup.
//!
//! The terminal UI owns stdout, so in that mode logs go to a file through a
//! non-blocking appender. Headless mode logs to stdout.

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    File,
    Stdout,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// `RUST_LOG` if set, otherwise `info`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Returns the log file path in file mode.
pub fn init(target: LogTarget, config: &LoggingConfig) -> Result<Option<PathBuf>, LoggingError> {
    match target {
        LogTarget::Stdout => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .try_init()
                .map_err(|e| LoggingError::Install(e.to_string()))?;
            Ok(None)
        },
        LogTarget::File => {
            let dir = &config.directory;
            fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            let appender = tracing_appender::rolling::never(dir, &config.file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(writer)
                .try_init()
                .map_err(|e| LoggingError::Install(e.to_string()))?;
            let _ = LOG_GUARD.set(guard);

            let path = dir.join(&config.file_name);
            tracing::info!(path = %path.display(), "Logging to file");
            Ok(Some(path))
        },
    }
}

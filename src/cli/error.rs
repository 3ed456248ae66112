//! CLI error types and conversions

use crate::config::ConfigError;
use crate::metrics::MetricsError;
use crate::schedule::ScheduleError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Schedule file error
    #[error("schedule error: {0}")]
    ScheduleError(#[from] ScheduleError),

    /// Config file error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    /// Metrics exporter error
    #[error("metrics error: {0}")]
    MetricsError(#[from] MetricsError),

    /// JSON output could not be rendered
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Some schedule entries are invalid
    #[error("schedule contains {0} invalid entries")]
    InvalidEntries(usize),

    /// Some recordings failed or the run was interrupted
    #[error("{failed} recording job(s) failed (interrupted: {interrupted})")]
    JobsFailed {
        /// Failed job count
        failed: usize,
        /// Whether a shutdown request cut the run short
        interrupted: bool,
    },
}

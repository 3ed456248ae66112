//! On-disk recorder configuration
//!
//! `config.json` holds the output location, network timeouts and the API
//! identity. Every field is optional; a missing file is created with the
//! defaults so users have something to edit.

use crate::downloader::config::{
    ExecutorSettings, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_EXTENSION, DEFAULT_OUTPUT_DIR,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::session::{HttpSettings, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("config file '{}': {source}", path.display())]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`RecorderConfig`]
    #[error("error parsing config file '{}': {source}", path.display())]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },
}

/// Recorder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Directory receiving recordings
    pub output_dir: PathBuf,
    /// Extension of segments and recordings
    pub file_extension: String,
    /// Parent of staging workspaces (OS temp dir if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Streaming API base URL
    pub api_base_url: String,
    /// `X-Radiko-App`
    pub app_name: String,
    /// `X-Radiko-App-Version`
    pub app_version: String,
    /// `X-Radiko-User`
    pub user: String,
    /// `X-Radiko-Device`
    pub device: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            file_extension: DEFAULT_EXTENSION.to_string(),
            temp_dir: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            api_base_url: session.base_url,
            app_name: session.app_name,
            app_version: session.app_version,
            user: session.user,
            device: session.device,
        }
    }
}

impl RecorderConfig {
    /// Load the configuration at `path`.
    ///
    /// A missing file yields the defaults, which are also written to `path`;
    /// failing to write them is logged and otherwise ignored.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                match config.save(path) {
                    Ok(()) => info!(path = %path.display(), "Created default config file"),
                    Err(e) => warn!(error = %e, "Failed to write default config file"),
                }
                Ok(config)
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json + "\n").map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// HTTP client settings
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// Streaming session identity
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            base_url: self.api_base_url.clone(),
            app_name: self.app_name.clone(),
            app_version: self.app_version.clone(),
            user: self.user.clone(),
            device: self.device.clone(),
        }
    }

    /// Executor settings
    pub fn executor_settings(&self, force: bool) -> ExecutorSettings {
        ExecutorSettings::new(self.output_dir.clone())
            .with_extension(self.file_extension.clone())
            .with_temp_root(self.temp_dir.clone())
            .with_force(force)
    }
}

//! HTTP client construction shared by the session and the segment downloader
//!
//! A single `reqwest::Client` is built per run from explicit settings and
//! handed to every component that needs one, so connection pooling works
//! across the playlist requests and the segment downloads.

use reqwest::Client;
use std::time::Duration;

use crate::downloader::config::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("timeshift-recorder/", env!("CARGO_PKG_VERSION"));

/// Network-layer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Time allowed to establish a TCP connection
    pub connect_timeout: Duration,
    /// Overall time allowed for one request, body included
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Build the HTTP client with explicit timeouts so a stalled segment cannot
/// hang the job forever.
pub fn build_http_client(settings: &HttpSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()
}

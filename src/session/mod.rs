//! Streaming session capability
//!
//! The recorder never talks to a concrete API client directly. It consumes a
//! [`StreamingSession`], which exposes three independently failable
//! operations:
//!
//! 1. [`StreamingSession::authorize`] obtains an auth token and must succeed
//!    before anything else;
//! 2. [`StreamingSession::resolve_playlist`] derives the time-shifted playlist
//!    for a station and occurrence;
//! 3. [`StreamingSession::expand_segments`] turns that playlist into the
//!    ordered list of segment URIs.
//!
//! [`radiko::RadikoSession`] implements the capability against a Radiko-style
//! time-shift API; tests substitute their own implementations.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use std::fmt;

pub mod http;
pub mod m3u8;
pub mod program_guide;
pub mod radiko;

pub use http::{build_http_client, HttpSettings};
pub use radiko::{RadikoSession, SessionConfig};

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Token exchange failed
    #[error("authorization failed: {0}")]
    Auth(String),

    /// Time-shifted playlist could not be derived
    #[error("playlist resolution failed: {0}")]
    Playlist(String),

    /// Playlist could not be expanded into segment URIs
    #[error("segment list expansion failed: {0}")]
    Expansion(String),

    /// An operation was attempted before a successful authorization
    #[error("session is not authorized")]
    NotAuthorized,
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Ordered segment URIs in broadcast order
pub type SegmentList = Vec<String>;

/// Auth token returned by a successful authorization
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw token value
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(****)")
    }
}

/// Opaque reference to a time-shifted playlist resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistHandle(String);

impl PlaylistHandle {
    /// Wrap a playlist URI
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Playlist URI
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability wrapper around an external time-shift streaming API
#[async_trait]
pub trait StreamingSession: Send + Sync {
    /// Obtain an auth token. No retry is attempted on failure.
    async fn authorize(&mut self) -> SessionResult<AuthToken>;

    /// Resolve the playlist for `station_id` starting at `occurrence`.
    async fn resolve_playlist(
        &self,
        station_id: &str,
        occurrence: DateTime<FixedOffset>,
    ) -> SessionResult<PlaylistHandle>;

    /// Expand a playlist into its segment URIs, preserving playlist order.
    async fn expand_segments(&self, playlist: &PlaylistHandle) -> SessionResult<SegmentList>;
}

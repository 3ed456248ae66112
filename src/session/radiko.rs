//! Radiko time-shift session
//!
//! Implements [`StreamingSession`] against the Radiko HTTP API:
//!
//! - `auth1` hands out a token plus an offset/length into a fixed app key;
//! - `auth2` activates the token given the base64 of that key slice;
//! - the weekly program guide supplies the program's end time;
//! - `ts/playlist.m3u8` returns a master playlist whose first URI is the
//!   chunklist, which in turn lists the AAC segments.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, FixedOffset};
use reqwest::{Client, Response};
use tracing::{debug, info};
use url::Url;

use super::m3u8;
use super::program_guide::{format_guide_timestamp, ProgramGuide};
use super::{AuthToken, PlaylistHandle, SegmentList, SessionError, SessionResult, StreamingSession};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://radiko.jp";

/// Key the partial key is sliced from (public HTML5 player key)
pub const AUTH_KEY: &str = "bcd151073c03b352e1ef2fd66c32209da9ca0afa";

/// Header carrying the auth token in both directions
pub const AUTH_TOKEN_HEADER: &str = "X-Radiko-AuthToken";

const KEY_LENGTH_HEADER: &str = "X-Radiko-KeyLength";
const KEY_OFFSET_HEADER: &str = "X-Radiko-KeyOffset";
const PARTIAL_KEY_HEADER: &str = "X-Radiko-PartialKey";

/// Length in minutes requested for each time-shift chunk
const PLAYLIST_CHUNK_MINUTES: &str = "15";

/// Identity presented to the API during authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// API base URL (no trailing slash required)
    pub base_url: String,
    /// `X-Radiko-App`
    pub app_name: String,
    /// `X-Radiko-App-Version`
    pub app_version: String,
    /// `X-Radiko-User`
    pub user: String,
    /// `X-Radiko-Device`
    pub device: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_name: "pc_html5".to_string(),
            app_version: "0.0.1".to_string(),
            user: "dummy_user".to_string(),
            device: "pc".to_string(),
        }
    }
}

/// Radiko-backed [`StreamingSession`]
pub struct RadikoSession {
    client: Client,
    config: SessionConfig,
    token: Option<AuthToken>,
}

impl RadikoSession {
    /// Create an unauthorized session
    pub fn new(client: Client, config: SessionConfig) -> Self {
        Self {
            client,
            config,
            token: None,
        }
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn token(&self) -> SessionResult<&AuthToken> {
        self.token.as_ref().ok_or(SessionError::NotAuthorized)
    }

    /// Fetch the weekly program guide XML of a station
    pub async fn fetch_program_guide(&self, station_id: &str) -> SessionResult<ProgramGuide> {
        let url = self.endpoint(&format!("/v3/program/station/weekly/{station_id}.xml"));
        debug!(url = %url, "Fetching program guide");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SessionError::Playlist(format!("failed to get program guide: {e}")))?;
        let response = require_success(response)
            .map_err(|status| SessionError::Playlist(format!("failed to get program guide: status code {status}")))?;
        let body = response
            .text()
            .await
            .map_err(|e| SessionError::Playlist(format!("failed to read program guide: {e}")))?;

        ProgramGuide::parse(&body).map_err(|e| SessionError::Playlist(e.to_string()))
    }
}

/// Base64 of `AUTH_KEY[offset..offset + length]`
pub fn partial_key(offset: usize, length: usize) -> SessionResult<String> {
    let slice = offset
        .checked_add(length)
        .and_then(|end| AUTH_KEY.get(offset..end))
        .filter(|slice| !slice.is_empty())
        .ok_or_else(|| {
            SessionError::Auth(format!(
                "key slice {offset}+{length} is outside the {}-byte auth key",
                AUTH_KEY.len()
            ))
        })?;
    Ok(STANDARD.encode(slice))
}

fn require_success(response: Response) -> Result<Response, u16> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(status.as_u16())
    }
}

fn header_value<'a>(response: &'a Response, name: &str) -> SessionResult<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| SessionError::Auth(format!("auth1 response is missing the {name} header")))
}

fn header_number(response: &Response, name: &str) -> SessionResult<usize> {
    let raw = header_value(response, name)?;
    raw.parse()
        .map_err(|_| SessionError::Auth(format!("{name} header is not a number: '{raw}'")))
}

#[async_trait]
impl StreamingSession for RadikoSession {
    async fn authorize(&mut self) -> SessionResult<AuthToken> {
        self.token = None;

        let auth1 = self
            .client
            .get(self.endpoint("/v2/api/auth1"))
            .header("X-Radiko-App", &self.config.app_name)
            .header("X-Radiko-App-Version", &self.config.app_version)
            .header("X-Radiko-User", &self.config.user)
            .header("X-Radiko-Device", &self.config.device)
            .send()
            .await
            .map_err(|e| SessionError::Auth(format!("auth1 request failed: {e}")))?;
        let auth1 = require_success(auth1)
            .map_err(|status| SessionError::Auth(format!("auth1 returned HTTP status {status}")))?;

        let token = header_value(&auth1, AUTH_TOKEN_HEADER)?.to_string();
        let key_length = header_number(&auth1, KEY_LENGTH_HEADER)?;
        let key_offset = header_number(&auth1, KEY_OFFSET_HEADER)?;
        let partial = partial_key(key_offset, key_length)?;
        debug!(key_offset, key_length, "auth1 succeeded");

        let auth2 = self
            .client
            .get(self.endpoint("/v2/api/auth2"))
            .header(AUTH_TOKEN_HEADER, &token)
            .header(PARTIAL_KEY_HEADER, &partial)
            .header("X-Radiko-User", &self.config.user)
            .header("X-Radiko-Device", &self.config.device)
            .send()
            .await
            .map_err(|e| SessionError::Auth(format!("auth2 request failed: {e}")))?;
        let auth2 = require_success(auth2)
            .map_err(|status| SessionError::Auth(format!("auth2 returned HTTP status {status}")))?;

        // auth2 answers with the area code, e.g. "JP13,tokyo Japan"
        if let Ok(area) = auth2.text().await {
            debug!(area = %area.trim(), "auth2 succeeded");
        }

        let token = AuthToken::new(token);
        self.token = Some(token.clone());
        info!("Auth token authorized");
        Ok(token)
    }

    async fn resolve_playlist(
        &self,
        station_id: &str,
        occurrence: DateTime<FixedOffset>,
    ) -> SessionResult<PlaylistHandle> {
        let token = self.token()?;
        let ft = format_guide_timestamp(&occurrence);

        let guide = self.fetch_program_guide(station_id).await?;
        let program = guide.find_by_start(station_id, &occurrence).ok_or_else(|| {
            SessionError::Playlist(format!("no program of station {station_id} starts at {ft}"))
        })?;
        debug!(title = %program.title, ft = %program.ft, to = %program.to, "Matched program guide entry");

        let response = self
            .client
            .post(self.endpoint("/v2/api/ts/playlist.m3u8"))
            .query(&[
                ("station_id", station_id),
                ("l", PLAYLIST_CHUNK_MINUTES),
                ("ft", ft.as_str()),
                ("to", program.to.as_str()),
            ])
            .header(AUTH_TOKEN_HEADER, token.as_str())
            .send()
            .await
            .map_err(|e| SessionError::Playlist(format!("playlist request failed: {e}")))?;
        let response = require_success(response).map_err(|status| {
            SessionError::Playlist(format!("playlist request returned HTTP status {status}"))
        })?;

        let base = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| SessionError::Playlist(format!("failed to read playlist: {e}")))?;
        let uris = m3u8::parse_uris(&body, &base).map_err(|e| SessionError::Playlist(e.to_string()))?;

        uris.into_iter()
            .next()
            .map(PlaylistHandle::new)
            .ok_or_else(|| SessionError::Playlist("master playlist contains no stream URI".to_string()))
    }

    async fn expand_segments(&self, playlist: &PlaylistHandle) -> SessionResult<SegmentList> {
        let token = self.token()?;
        let url = Url::parse(playlist.as_str())
            .map_err(|e| SessionError::Expansion(format!("invalid playlist URI '{playlist}': {e}")))?;

        let response = self
            .client
            .get(url)
            .header(AUTH_TOKEN_HEADER, token.as_str())
            .send()
            .await
            .map_err(|e| SessionError::Expansion(format!("chunklist request failed: {e}")))?;
        let response = require_success(response).map_err(|status| {
            SessionError::Expansion(format!("chunklist request returned HTTP status {status}"))
        })?;

        let base = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| SessionError::Expansion(format!("failed to read chunklist: {e}")))?;

        m3u8::parse_uris(&body, &base).map_err(|e| SessionError::Expansion(e.to_string()))
    }
}

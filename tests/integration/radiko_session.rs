//! Radiko session against a mock API server

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use timeshift_recorder::session::radiko::AUTH_KEY;
use timeshift_recorder::session::{
    PlaylistHandle, RadikoSession, SessionConfig, SessionError, StreamingSession,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token-123";

const GUIDE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<radiko>
  <stations>
    <station id="TBS">
      <name>TBS RADIO</name>
      <progs>
        <date>20260113</date>
        <prog ft="20260113010000" to="20260113030000" ftl="0100" tol="0300" dur="7200">
          <title>Tuesday JUNK</title>
        </prog>
        <prog ft="20260113030000" to="20260113050000" ftl="0300" tol="0500" dur="7200">
          <title>Early Morning</title>
        </prog>
      </progs>
    </station>
  </stations>
</radiko>"#;

fn occurrence() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2026-01-13T01:00:00+09:00").unwrap()
}

fn session_for(server: &MockServer) -> RadikoSession {
    RadikoSession::new(
        Client::new(),
        SessionConfig {
            base_url: server.uri(),
            ..SessionConfig::default()
        },
    )
}

async fn mount_auth(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/api/auth1"))
        .and(header("X-Radiko-App", "pc_html5"))
        .and(header("X-Radiko-User", "dummy_user"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Radiko-AuthToken", TOKEN)
                .insert_header("X-Radiko-KeyLength", "16")
                .insert_header("X-Radiko-KeyOffset", "8"),
        )
        .expect(1)
        .mount(server)
        .await;

    let partial = STANDARD.encode(&AUTH_KEY[8..24]);
    Mock::given(method("GET"))
        .and(path("/v2/api/auth2"))
        .and(header("X-Radiko-AuthToken", TOKEN))
        .and(header("X-Radiko-PartialKey", partial.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("JP13,tokyo Japan"))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_guide(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v3/program/station/weekly/TBS.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(GUIDE))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_authorize_exchanges_partial_key() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let mut session = session_for(&server);
    let token = session.authorize().await.unwrap();
    assert_eq!(token.as_str(), TOKEN);
}

#[tokio::test]
async fn test_auth1_rejection_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/api/auth1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    match session.authorize().await {
        Err(SessionError::Auth(msg)) => assert!(msg.contains("403"), "unexpected message: {msg}"),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_auth1_without_token_header_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/api/auth1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Radiko-KeyLength", "16")
                .insert_header("X-Radiko-KeyOffset", "0"),
        )
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    assert!(matches!(session.authorize().await, Err(SessionError::Auth(_))));
}

#[tokio::test]
async fn test_auth2_rejection_leaves_session_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/api/auth1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Radiko-AuthToken", TOKEN)
                .insert_header("X-Radiko-KeyLength", "16")
                .insert_header("X-Radiko-KeyOffset", "0"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/api/auth2"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    assert!(matches!(session.authorize().await, Err(SessionError::Auth(_))));
    assert!(matches!(
        session.resolve_playlist("TBS", occurrence()).await,
        Err(SessionError::NotAuthorized)
    ));
}

#[tokio::test]
async fn test_resolve_playlist_and_expand_segments() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_guide(&server).await;

    Mock::given(method("POST"))
        .and(path("/v2/api/ts/playlist.m3u8"))
        .and(query_param("station_id", "TBS"))
        .and(query_param("l", "15"))
        .and(query_param("ft", "20260113010000"))
        .and(query_param("to", "20260113030000"))
        .and(header("X-Radiko-AuthToken", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-STREAM-INF:BANDWIDTH=52973,CODECS=\"mp4a.40.5\"\n/media/chunklist.m3u8\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/media/chunklist.m3u8"))
        .and(header("X-Radiko-AuthToken", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "#EXTM3U\n#EXT-X-TARGETDURATION:5\n#EXTINF:5,\nseg/0.aac\n#EXTINF:5,\nseg/1.aac\n#EXTINF:5,\nseg/2.aac\n#EXT-X-ENDLIST\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session.authorize().await.unwrap();

    let playlist = session.resolve_playlist("TBS", occurrence()).await.unwrap();
    assert_eq!(playlist.as_str(), format!("{}/media/chunklist.m3u8", server.uri()));

    let segments = session.expand_segments(&playlist).await.unwrap();
    assert_eq!(
        segments,
        vec![
            format!("{}/media/seg/0.aac", server.uri()),
            format!("{}/media/seg/1.aac", server.uri()),
            format!("{}/media/seg/2.aac", server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_unknown_program_is_playlist_error() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_guide(&server).await;

    let mut session = session_for(&server);
    session.authorize().await.unwrap();

    let not_in_guide = DateTime::parse_from_rfc3339("2026-01-13T02:00:00+09:00").unwrap();
    match session.resolve_playlist("TBS", not_in_guide).await {
        Err(SessionError::Playlist(msg)) => assert!(msg.contains("20260113020000")),
        other => panic!("expected playlist error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_playlist_rejection_is_playlist_error() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_guide(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2/api/ts/playlist.m3u8"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session.authorize().await.unwrap();

    assert!(matches!(
        session.resolve_playlist("TBS", occurrence()).await,
        Err(SessionError::Playlist(_))
    ));
}

#[tokio::test]
async fn test_chunklist_failure_is_expansion_error() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/media/chunklist.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not a playlist"))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session.authorize().await.unwrap();

    let playlist = PlaylistHandle::new(format!("{}/media/chunklist.m3u8", server.uri()));
    assert!(matches!(
        session.expand_segments(&playlist).await,
        Err(SessionError::Expansion(_))
    ));
}

#[tokio::test]
async fn test_fetch_program_guide() {
    let server = MockServer::start().await;
    mount_guide(&server).await;

    let session = session_for(&server);
    let guide = session.fetch_program_guide("TBS").await.unwrap();

    assert_eq!(guide.station_programs("TBS").count(), 2);
    assert_eq!(guide.find_program_title("0300", "火").unwrap(), "Early Morning");
}

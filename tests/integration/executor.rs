//! Job executor with a scripted streaming session

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use std::path::Path;
use std::sync::Mutex;
use timeshift_recorder::downloader::{
    DownloadError, ExecutorSettings, JobExecutor, JobFailure, JobOutcome, JobStage,
};
use timeshift_recorder::schedule::ScheduleEntry;
use timeshift_recorder::session::{
    AuthToken, PlaylistHandle, SegmentList, SessionError, SessionResult, StreamingSession,
};
use timeshift_recorder::shutdown::ShutdownCoordinator;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Session whose answers are fixed up front
#[derive(Default)]
struct ScriptedSession {
    segments: Vec<String>,
    auth_error: Option<String>,
    playlist_error: Option<String>,
    expand_error: Option<String>,
    authorize_calls: usize,
    resolved: Mutex<Vec<(String, DateTime<FixedOffset>)>>,
}

impl ScriptedSession {
    fn with_segments(segments: Vec<String>) -> Self {
        Self {
            segments,
            ..Self::default()
        }
    }
}

#[async_trait]
impl StreamingSession for ScriptedSession {
    async fn authorize(&mut self) -> SessionResult<AuthToken> {
        self.authorize_calls += 1;
        match &self.auth_error {
            Some(msg) => Err(SessionError::Auth(msg.clone())),
            None => Ok(AuthToken::new("scripted")),
        }
    }

    async fn resolve_playlist(
        &self,
        station_id: &str,
        occurrence: DateTime<FixedOffset>,
    ) -> SessionResult<PlaylistHandle> {
        self.resolved
            .lock()
            .unwrap()
            .push((station_id.to_string(), occurrence));
        match &self.playlist_error {
            Some(msg) => Err(SessionError::Playlist(msg.clone())),
            None => Ok(PlaylistHandle::new("https://example.invalid/chunklist.m3u8")),
        }
    }

    async fn expand_segments(&self, _playlist: &PlaylistHandle) -> SessionResult<SegmentList> {
        match &self.expand_error {
            Some(msg) => Err(SessionError::Expansion(msg.clone())),
            None => Ok(self.segments.clone()),
        }
    }
}

fn now() -> DateTime<FixedOffset> {
    // Tuesday
    DateTime::parse_from_rfc3339("2026-01-13T10:00:00+09:00").unwrap()
}

fn entry() -> ScheduleEntry {
    ScheduleEntry::new("Tuesday JUNK", "火", "010000", "TBS")
}

const OUTPUT_NAME: &str = "20260113010000-TBS-Tuesday JUNK.aac";

async fn media_server(bodies: &[&[u8]]) -> (MockServer, Vec<String>) {
    let server = MockServer::start().await;
    let mut uris = Vec::new();
    for (i, body) in bodies.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(format!("/media/{i}.aac")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&server)
            .await;
        uris.push(format!("{}/media/{i}.aac", server.uri()));
    }
    (server, uris)
}

struct Dirs {
    _root: tempfile::TempDir,
    output: std::path::PathBuf,
    staging: std::path::PathBuf,
}

fn dirs() -> Dirs {
    let root = tempfile::tempdir().unwrap();
    let output = root.path().join("output");
    let staging = root.path().join("staging");
    Dirs {
        _root: root,
        output,
        staging,
    }
}

fn executor(dirs: &Dirs, force: bool) -> JobExecutor {
    JobExecutor::new(
        ExecutorSettings::new(&dirs.output)
            .with_temp_root(Some(dirs.staging.clone()))
            .with_force(force),
        Client::new(),
    )
}

fn staging_is_empty(staging: &Path) -> bool {
    !staging.exists() || std::fs::read_dir(staging).unwrap().next().is_none()
}

#[tokio::test]
async fn test_records_concatenation_in_order() {
    let (_server, uris) = media_server(&[b"AA", b"BBB", b"C"]).await;
    let dirs = dirs();
    let mut session = ScriptedSession::with_segments(uris);

    let outcome = executor(&dirs, false)
        .execute(&mut session, &entry(), now())
        .await
        .unwrap();

    let expected_path = dirs.output.join(OUTPUT_NAME);
    assert_eq!(
        outcome,
        JobOutcome::Recorded {
            path: expected_path.clone(),
            bytes: 6,
            segments: 3,
        }
    );
    assert_eq!(std::fs::read(&expected_path).unwrap(), b"AABBBC");
    assert!(staging_is_empty(&dirs.staging));

    let resolved = session.resolved.lock().unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].0, "TBS");
    assert_eq!(resolved[0].1.to_rfc3339(), "2026-01-13T01:00:00+09:00");
}

#[tokio::test]
async fn test_dotted_extension_names_single_dot_output() {
    let (_server, uris) = media_server(&[b"AA", b"B"]).await;
    let dirs = dirs();
    let mut session = ScriptedSession::with_segments(uris);

    let outcome = JobExecutor::new(
        ExecutorSettings::new(&dirs.output)
            .with_extension(".m4a")
            .with_temp_root(Some(dirs.staging.clone())),
        Client::new(),
    )
    .execute(&mut session, &entry(), now())
    .await
    .unwrap();

    let expected_path = dirs.output.join("20260113010000-TBS-Tuesday JUNK.m4a");
    assert!(matches!(
        &outcome,
        JobOutcome::Recorded { path, bytes: 3, .. } if *path == expected_path
    ));
    assert_eq!(std::fs::read(&expected_path).unwrap(), b"AAB");
}

#[tokio::test]
async fn test_existing_output_is_skipped_without_contacting_service() {
    let dirs = dirs();
    std::fs::create_dir_all(&dirs.output).unwrap();
    let existing = dirs.output.join(OUTPUT_NAME);
    std::fs::write(&existing, b"previous").unwrap();
    let mut session = ScriptedSession::default();

    let outcome = executor(&dirs, false)
        .execute(&mut session, &entry(), now())
        .await
        .unwrap();

    assert_eq!(outcome, JobOutcome::Skipped { path: existing.clone() });
    assert_eq!(session.authorize_calls, 0);
    assert_eq!(std::fs::read(&existing).unwrap(), b"previous");
}

#[tokio::test]
async fn test_force_replaces_existing_output() {
    let (_server, uris) = media_server(&[b"new"]).await;
    let dirs = dirs();
    std::fs::create_dir_all(&dirs.output).unwrap();
    let existing = dirs.output.join(OUTPUT_NAME);
    std::fs::write(&existing, b"previous").unwrap();
    let mut session = ScriptedSession::with_segments(uris);

    let outcome = executor(&dirs, true)
        .execute(&mut session, &entry(), now())
        .await
        .unwrap();

    assert!(matches!(outcome, JobOutcome::Recorded { bytes: 3, .. }));
    assert_eq!(std::fs::read(&existing).unwrap(), b"new");
}

#[tokio::test]
async fn test_authorization_failure_stops_job() {
    let dirs = dirs();
    let mut session = ScriptedSession {
        auth_error: Some("auth1 returned HTTP status 403".to_string()),
        ..ScriptedSession::default()
    };

    let err = executor(&dirs, false)
        .execute(&mut session, &entry(), now())
        .await
        .unwrap_err();

    assert_eq!(err.stage, JobStage::Authorize);
    assert_eq!(err.program, "Tuesday JUNK");
    assert!(matches!(err.source, JobFailure::Session(SessionError::Auth(_))));
    assert!(session.resolved.lock().unwrap().is_empty());
    assert!(!dirs.output.join(OUTPUT_NAME).exists());
}

#[tokio::test]
async fn test_playlist_failure_reports_stage() {
    let dirs = dirs();
    let mut session = ScriptedSession {
        playlist_error: Some("no program".to_string()),
        ..ScriptedSession::default()
    };

    let err = executor(&dirs, false)
        .execute(&mut session, &entry(), now())
        .await
        .unwrap_err();

    assert_eq!(err.stage, JobStage::ResolvePlaylist);
    assert!(err.to_string().contains("Tuesday JUNK"));
}

#[tokio::test]
async fn test_expansion_failure_reports_stage() {
    let dirs = dirs();
    let mut session = ScriptedSession {
        expand_error: Some("bad chunklist".to_string()),
        ..ScriptedSession::default()
    };

    let err = executor(&dirs, false)
        .execute(&mut session, &entry(), now())
        .await
        .unwrap_err();

    assert_eq!(err.stage, JobStage::ExpandSegments);
    assert!(matches!(
        err.source,
        JobFailure::Session(SessionError::Expansion(_))
    ));
}

#[tokio::test]
async fn test_segment_failure_leaves_no_output_or_staging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/0.aac"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/1.aac"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let uris = vec![
        format!("{}/media/0.aac", server.uri()),
        format!("{}/media/1.aac", server.uri()),
    ];

    let dirs = dirs();
    let mut session = ScriptedSession::with_segments(uris.clone());

    let err = executor(&dirs, false)
        .execute(&mut session, &entry(), now())
        .await
        .unwrap_err();

    assert_eq!(err.stage, JobStage::Download);
    match &err.source {
        JobFailure::Download(download) => {
            assert_eq!(download.failed_index(), Some(1));
            assert_eq!(download.failed_uri(), Some(uris[1].as_str()));
        }
        other => panic!("expected download failure, got {other:?}"),
    }
    assert!(!dirs.output.join(OUTPUT_NAME).exists());
    assert!(staging_is_empty(&dirs.staging));
}

#[tokio::test]
async fn test_failed_forced_rerecord_keeps_previous_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dirs = dirs();
    std::fs::create_dir_all(&dirs.output).unwrap();
    let existing = dirs.output.join(OUTPUT_NAME);
    std::fs::write(&existing, b"previous").unwrap();
    let mut session =
        ScriptedSession::with_segments(vec![format!("{}/media/0.aac", server.uri())]);

    let err = executor(&dirs, true)
        .execute(&mut session, &entry(), now())
        .await
        .unwrap_err();

    assert_eq!(err.stage, JobStage::Download);
    assert_eq!(std::fs::read(&existing).unwrap(), b"previous");
}

#[tokio::test]
async fn test_empty_segment_list_fails_assembly() {
    let dirs = dirs();
    let mut session = ScriptedSession::with_segments(Vec::new());

    let err = executor(&dirs, false)
        .execute(&mut session, &entry(), now())
        .await
        .unwrap_err();

    assert_eq!(err.stage, JobStage::Assemble);
    assert!(!dirs.output.join(OUTPUT_NAME).exists());
    assert!(staging_is_empty(&dirs.staging));
}

#[tokio::test]
async fn test_run_schedule_continues_past_failures() {
    let (_server, uris) = media_server(&[b"x"]).await;
    let dirs = dirs();
    std::fs::create_dir_all(&dirs.output).unwrap();
    // Saturday slot already recorded
    std::fs::write(dirs.output.join("20260110220000-QRR-Saturday Night.aac"), b"done").unwrap();

    let entries = vec![
        ScheduleEntry::new("Broken", "Funday", "010000", "TBS"),
        entry(),
        ScheduleEntry::new("Saturday Night", "土", "220000", "QRR"),
    ];
    let mut session = ScriptedSession::with_segments(uris);

    let summary = executor(&dirs, false)
        .run_schedule(&mut session, &entries, now())
        .await;

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert!(!summary.interrupted);
    assert!(summary.has_failures());
    assert!(dirs.output.join(OUTPUT_NAME).exists());
}

/// Log sink shared between a scoped subscriber and the test body
#[derive(Clone, Default)]
struct CapturedLogs(std::sync::Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_invalid_entry_reported_once() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let dirs = dirs();
    let entries = vec![ScheduleEntry::new("Broken", "Funday", "010000", "TBS")];
    let mut session = ScriptedSession::default();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let summary = tracing::subscriber::with_default(subscriber, || {
        runtime.block_on(executor(&dirs, false).run_schedule(&mut session, &entries, now()))
    });

    assert_eq!(summary.failed, 1);
    assert_eq!(session.authorize_calls, 0);
    let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    let reports: Vec<&str> = text.lines().filter(|line| line.contains("Broken")).collect();
    assert_eq!(reports.len(), 1, "unexpected log lines: {text}");
    assert!(reports[0].contains("ERROR"));
}

#[tokio::test]
async fn test_run_schedule_counts_each_failure() {
    let dirs = dirs();
    let entries = vec![entry(), ScheduleEntry::new("Other", "水", "200000", "LFR")];
    let mut session = ScriptedSession {
        auth_error: Some("down".to_string()),
        ..ScriptedSession::default()
    };

    let summary = executor(&dirs, false)
        .run_schedule(&mut session, &entries, now())
        .await;

    assert_eq!(summary.failed, 2);
    assert_eq!(session.authorize_calls, 2);
}

#[tokio::test]
async fn test_shutdown_stops_run_before_next_entry() {
    let dirs = dirs();
    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();
    let mut session = ScriptedSession::default();

    let summary = executor(&dirs, false)
        .with_shutdown(shutdown)
        .run_schedule(&mut session, &[entry()], now())
        .await;

    assert!(summary.interrupted);
    assert_eq!(summary.completed + summary.skipped + summary.failed, 0);
    assert_eq!(session.authorize_calls, 0);
}

#[tokio::test]
async fn test_shutdown_during_download_cancels_job() {
    let dirs = dirs();
    let shutdown = ShutdownCoordinator::shared();
    let mut session =
        ScriptedSession::with_segments(vec!["http://127.0.0.1:9/media/0.aac".to_string()]);

    // Requested after planning but before the first segment is fetched
    shutdown.request_shutdown();
    let err = executor(&dirs, false)
        .with_shutdown(shutdown)
        .execute(&mut session, &entry(), now())
        .await
        .unwrap_err();

    assert_eq!(err.stage, JobStage::Download);
    assert!(matches!(
        err.source,
        JobFailure::Download(DownloadError::Cancelled { index: 0 })
    ));
    assert!(staging_is_empty(&dirs.staging));
}

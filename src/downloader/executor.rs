//! Recording executor
//!
//! Drives one schedule entry through resolve → authorize → playlist →
//! segments → download → assemble, and a whole schedule through that
//! pipeline one entry at a time.

use crate::downloader::config::ExecutorSettings;
use crate::downloader::job::{JobError, JobFailure, JobStage, RecordingJob};
use crate::downloader::progress::{create_progress_bar, ProgressTracker};
use crate::downloader::segment::SegmentDownloader;
use crate::downloader::workspace::Workspace;
use crate::downloader::DownloadError;
use crate::metrics::RecordingMetrics;
use crate::output::{assemble, OutputError, OutputPathBuilder};
use crate::schedule::{resolve, ScheduleEntry};
use crate::session::StreamingSession;
use crate::shutdown::{self, SharedShutdown};
use chrono::{DateTime, TimeZone};
use reqwest::Client;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn, Instrument};

/// Result of a job that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Output file was assembled
    Recorded {
        /// Output file
        path: PathBuf,
        /// Bytes written
        bytes: u64,
        /// Segments assembled
        segments: usize,
    },
    /// Output already existed and `force` was not set
    Skipped {
        /// Existing output file
        path: PathBuf,
    },
}

impl JobOutcome {
    /// Output file of the job
    pub fn path(&self) -> &Path {
        match self {
            Self::Recorded { path, .. } | Self::Skipped { path } => path,
        }
    }
}

/// Counts of a schedule run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Recordings assembled
    pub completed: usize,
    /// Entries skipped because their output existed
    pub skipped: usize,
    /// Entries that failed (invalid entries included)
    pub failed: usize,
    /// Whether the run stopped early on a shutdown request
    pub interrupted: bool,
}

impl RunSummary {
    /// Whether any entry failed or the run was cut short
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.interrupted
    }
}

/// Resolve the occurrence of `entry` relative to `now` and name its output.
pub fn plan_job<Tz: TimeZone>(
    settings: &ExecutorSettings,
    entry: &ScheduleEntry,
    now: &DateTime<Tz>,
) -> Result<RecordingJob, JobError> {
    let fail = |source: JobFailure| JobError {
        program: entry.program_name.clone(),
        stage: JobStage::Resolve,
        source,
    };

    let occurrence = resolve(entry, now).map_err(|e| fail(e.into()))?;
    let output_path = OutputPathBuilder::new(
        settings.output_dir.clone(),
        occurrence,
        &entry.station_id,
        &entry.program_name,
    )
    .with_extension(&settings.extension)
    .build()
    .map_err(|e| fail(e.into()))?;

    Ok(RecordingJob::new(entry.clone(), occurrence, output_path))
}

/// Executes recording jobs with explicitly supplied configuration
pub struct JobExecutor {
    settings: ExecutorSettings,
    client: Client,
    shutdown: Option<SharedShutdown>,
    progress_tracker: ProgressTracker,
    show_progress: bool,
}

impl JobExecutor {
    /// Create an executor writing per `settings` and downloading with `client`
    pub fn new(settings: ExecutorSettings, client: Client) -> Self {
        Self {
            settings,
            client,
            shutdown: None,
            progress_tracker: ProgressTracker::default(),
            show_progress: false,
        }
    }

    /// Attach a shared shutdown handle for graceful cancellation.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Override progress tracking configuration.
    pub fn with_progress_tracker(mut self, tracker: ProgressTracker) -> Self {
        self.progress_tracker = tracker;
        self
    }

    /// Draw a terminal progress bar while segments download.
    pub fn with_progress_bars(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Executor settings
    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Resolve the occurrence and output path of `entry` without any I/O.
    pub fn plan<Tz: TimeZone>(
        &self,
        entry: &ScheduleEntry,
        now: &DateTime<Tz>,
    ) -> Result<RecordingJob, JobError> {
        plan_job(&self.settings, entry, now)
    }

    /// Record the most recent occurrence of `entry`.
    pub async fn execute<Tz: TimeZone>(
        &self,
        session: &mut dyn StreamingSession,
        entry: &ScheduleEntry,
        now: DateTime<Tz>,
    ) -> Result<JobOutcome, JobError> {
        let span = tracing::info_span!(
            "record",
            program = %entry.program_name,
            station = %entry.station_id,
        );

        async {
            let metrics = RecordingMetrics::start(&entry.station_id, &entry.program_name);
            let result = match self.plan(entry, &now) {
                Ok(job) => self.run_job(session, job).await,
                Err(e) => Err(e),
            };

            match &result {
                Ok(JobOutcome::Recorded { bytes, segments, .. }) => {
                    metrics.record_success(*segments, *bytes)
                }
                Ok(JobOutcome::Skipped { .. }) => metrics.record_skipped(),
                Err(e) => metrics.record_failure(e.stage.as_str(), &e.source.to_string()),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_job(
        &self,
        session: &mut dyn StreamingSession,
        mut job: RecordingJob,
    ) -> Result<JobOutcome, JobError> {
        info!(
            occurrence = %job.occurrence,
            output = %job.output_path.display(),
            "Starting recording job"
        );

        if job.output_path.exists() && !self.settings.force {
            info!(path = %job.output_path.display(), "Output already exists; skipping");
            job.skip();
            return Ok(JobOutcome::Skipped {
                path: job.output_path,
            });
        }

        session.authorize().await.map_err(|e| job.fail(e))?;
        job.advance();

        let playlist = session
            .resolve_playlist(&job.entry.station_id, job.occurrence)
            .await
            .map_err(|e| job.fail(e))?;
        debug!(playlist = %playlist, "Playlist resolved");
        job.advance();

        let segments = session
            .expand_segments(&playlist)
            .await
            .map_err(|e| job.fail(e))?;
        info!(segments = segments.len(), "Segment list expanded");
        job.progress.total_segments = Some(segments.len() as u64);
        job.advance();

        let workspace = Workspace::create(self.settings.temp_root.as_deref())
            .map_err(|e| job.fail(JobFailure::Workspace(e)))?;

        let downloader = SegmentDownloader::new(self.client.clone())
            .for_station(job.entry.station_id.clone())
            .with_extension(self.settings.extension.clone())
            .with_shutdown(self.shutdown.clone())
            .with_progress_tracker(self.progress_tracker.clone());

        let bar = self.show_progress.then(|| {
            create_progress_bar(
                segments.len() as u64,
                format!("Recording {} ({})", job.entry.program_name, job.entry.station_id),
            )
        });
        let staged = downloader
            .download(&segments, workspace.path(), bar.as_ref())
            .await;
        if let Some(bar) = &bar {
            bar.finish_and_clear();
        }
        let staged = staged.map_err(|e| {
            // Segments before the failing index were staged
            let (DownloadError::Segment { index, .. } | DownloadError::Cancelled { index }) = &e;
            job.progress.downloaded_segments = *index as u64;
            warn!(
                staged = job.progress.downloaded_segments,
                percent = job.progress.percentage().unwrap_or_default(),
                "Segment download aborted"
            );
            job.fail(e)
        })?;
        job.progress.downloaded_segments = staged.len() as u64;
        job.advance();

        let paths: Vec<&Path> = staged.iter().map(|s| s.path.as_path()).collect();
        let bytes = self.assemble_output(&paths, &job.output_path).map_err(|e| job.fail(e))?;
        job.progress.bytes_written = bytes;
        job.advance();

        drop(workspace);
        job.advance();

        Ok(JobOutcome::Recorded {
            path: job.output_path,
            bytes: job.progress.bytes_written,
            segments: staged.len(),
        })
    }

    fn assemble_output(&self, paths: &[&Path], output: &Path) -> Result<u64, OutputError> {
        if paths.is_empty() {
            return Err(OutputError::NoSegments);
        }

        if let Some(dir) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        if self.settings.force && output.exists() {
            info!(path = %output.display(), "Removing existing output (force)");
            std::fs::remove_file(output).map_err(|source| OutputError::Io {
                path: output.to_path_buf(),
                source,
            })?;
        }

        match assemble(paths, output) {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                // CreateOutput means the file was never ours to delete
                if !matches!(err, OutputError::CreateOutput { .. } | OutputError::NoSegments) {
                    if let Err(e) = std::fs::remove_file(output) {
                        warn!(path = %output.display(), error = %e, "Failed to remove partial output");
                    }
                }
                Err(err)
            }
        }
    }

    /// Record every entry of a schedule, one after another.
    ///
    /// A failing entry is logged and counted; the run continues with the next
    /// one. A shutdown request stops the run before the next entry.
    pub async fn run_schedule<Tz: TimeZone>(
        &self,
        session: &mut dyn StreamingSession,
        entries: &[ScheduleEntry],
        now: DateTime<Tz>,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        for entry in entries {
            if shutdown::is_requested(self.shutdown.as_ref()) {
                info!("Shutdown requested - skipping remaining entries");
                summary.interrupted = true;
                break;
            }

            match self.execute(session, entry, now.clone()).await {
                Ok(JobOutcome::Recorded { .. }) => summary.completed += 1,
                Ok(JobOutcome::Skipped { .. }) => summary.skipped += 1,
                Err(e) if e.is_entry_error() => {
                    debug!(error = %e, "Invalid schedule entry; continuing with next entry");
                    summary.failed += 1;
                }
                Err(e) => {
                    if matches!(e.source, JobFailure::Download(DownloadError::Cancelled { .. })) {
                        summary.interrupted = true;
                    }
                    debug!(error = %e, "Recording job failed; continuing with next entry");
                    summary.failed += 1;
                }
            }
        }

        info!(
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failed,
            interrupted = summary.interrupted,
            "Schedule run finished"
        );
        summary
    }
}

//! Recording job structures and state tracking

use crate::output::OutputError;
use crate::schedule::{ScheduleEntry, ScheduleError};
use crate::session::SessionError;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::DownloadError;

/// Pipeline stage a job was in when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Occurrence resolution and output naming
    Resolve,
    /// Session authorization
    Authorize,
    /// Playlist resolution
    ResolvePlaylist,
    /// Playlist expansion into segments
    ExpandSegments,
    /// Workspace creation and segment download
    Download,
    /// Concatenation into the output file
    Assemble,
}

impl JobStage {
    /// Stable lowercase label, used for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Authorize => "authorize",
            Self::ResolvePlaylist => "resolve_playlist",
            Self::ExpandSegments => "expand_segments",
            Self::Download => "download",
            Self::Assemble => "assemble",
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Resolve => "occurrence resolution",
            Self::Authorize => "authorization",
            Self::ResolvePlaylist => "playlist resolution",
            Self::ExpandSegments => "segment listing",
            Self::Download => "segment download",
            Self::Assemble => "assembly",
        };
        f.write_str(label)
    }
}

/// Job execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case", tag = "state", content = "stage")]
pub enum JobState {
    /// Job has not started yet
    #[default]
    Pending,
    /// Occurrence and output path are known
    Resolved,
    /// Session holds a valid token
    Authorized,
    /// Playlist handle obtained
    PlaylistResolved,
    /// Segment URIs known
    SegmentsListed,
    /// Every segment staged
    Downloaded,
    /// Output file written
    Assembled,
    /// Job finished and workspace released
    Done,
    /// Output already existed
    Skipped,
    /// Job failed in the given stage
    Failed(JobStage),
}

impl JobState {
    /// Stage attempted next from this state, if any
    pub fn next_stage(&self) -> Option<JobStage> {
        match self {
            Self::Pending => Some(JobStage::Resolve),
            Self::Resolved => Some(JobStage::Authorize),
            Self::Authorized => Some(JobStage::ResolvePlaylist),
            Self::PlaylistResolved => Some(JobStage::ExpandSegments),
            Self::SegmentsListed => Some(JobStage::Download),
            Self::Downloaded => Some(JobStage::Assemble),
            Self::Assembled | Self::Done | Self::Skipped | Self::Failed(_) => None,
        }
    }

    /// State after the next stage succeeds
    pub fn next(&self) -> Self {
        match self {
            Self::Pending => Self::Resolved,
            Self::Resolved => Self::Authorized,
            Self::Authorized => Self::PlaylistResolved,
            Self::PlaylistResolved => Self::SegmentsListed,
            Self::SegmentsListed => Self::Downloaded,
            Self::Downloaded => Self::Assembled,
            Self::Assembled | Self::Done => Self::Done,
            Self::Skipped => Self::Skipped,
            Self::Failed(stage) => Self::Failed(*stage),
        }
    }

    /// Whether the job can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped | Self::Failed(_))
    }
}

/// Underlying cause of a job failure
#[derive(Debug, thiserror::Error)]
pub enum JobFailure {
    /// Schedule entry is invalid
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Streaming session failed
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Segment download failed
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Output naming or assembly failed
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Staging workspace could not be created
    #[error("failed to create staging workspace: {0}")]
    Workspace(#[source] std::io::Error),
}

/// A failed job: which program, which stage, and why
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed for '{program}': {source}")]
pub struct JobError {
    /// Program name of the schedule entry
    pub program: String,
    /// Stage that failed
    pub stage: JobStage,
    /// Underlying error
    #[source]
    pub source: JobFailure,
}

impl JobError {
    /// Build a job error from any failure convertible into [`JobFailure`]
    pub fn new(program: impl Into<String>, stage: JobStage, source: impl Into<JobFailure>) -> Self {
        Self {
            program: program.into(),
            stage,
            source: source.into(),
        }
    }

    /// Whether the failure is an invalid schedule entry
    pub fn is_entry_error(&self) -> bool {
        matches!(&self.source, JobFailure::Schedule(e) if e.is_entry_error())
    }
}

/// Job progress tracking
#[derive(Debug, Clone, Serialize, Default)]
pub struct JobProgress {
    /// Number of segments in the playlist
    pub total_segments: Option<u64>,
    /// Number of segments staged so far
    pub downloaded_segments: u64,
    /// Bytes written to the output file
    pub bytes_written: u64,
    /// Error message if job failed
    pub error: Option<String>,
}

impl JobProgress {
    /// Calculate download percentage (0.0 to 100.0)
    pub fn percentage(&self) -> Option<f64> {
        self.total_segments.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.downloaded_segments as f64 / total as f64) * 100.0
            }
        })
    }
}

/// One recording: a schedule entry bound to a concrete occurrence
#[derive(Debug, Clone, Serialize)]
pub struct RecordingJob {
    /// Schedule entry being recorded
    pub entry: ScheduleEntry,
    /// Resolved broadcast start
    pub occurrence: DateTime<FixedOffset>,
    /// Final output file
    pub output_path: PathBuf,
    /// Current state
    pub state: JobState,
    /// Progress counters
    pub progress: JobProgress,
}

impl RecordingJob {
    /// Create a job in the `Resolved` state
    pub fn new(entry: ScheduleEntry, occurrence: DateTime<FixedOffset>, output_path: PathBuf) -> Self {
        Self {
            entry,
            occurrence,
            output_path,
            state: JobState::Resolved,
            progress: JobProgress::default(),
        }
    }

    /// Move to the next state
    pub fn advance(&mut self) {
        self.state = self.state.next();
    }

    /// Mark the job skipped
    pub fn skip(&mut self) {
        self.state = JobState::Skipped;
    }

    /// Mark the job failed in the stage it was attempting and build the error
    pub fn fail(&mut self, source: impl Into<JobFailure>) -> JobError {
        let stage = self.state.next_stage().unwrap_or(JobStage::Assemble);
        let error = JobError::new(self.entry.program_name.clone(), stage, source);
        self.progress.error = Some(error.source.to_string());
        self.state = JobState::Failed(stage);
        error
    }
}

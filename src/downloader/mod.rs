//! Recording orchestration and segment downloading
//!
//! This module turns a schedule entry into a finished recording.
//!
//! # Overview
//!
//! 1. **Planning**: [`executor::JobExecutor::plan`] resolves the most recent
//!    occurrence and the output path of an entry
//! 2. **Session**: the executor authorizes a [`crate::session::StreamingSession`]
//!    and asks it for the playlist and its segment URIs
//! 3. **Download**: [`segment::SegmentDownloader`] fetches segments one by one
//!    into a per-job [`workspace::Workspace`]
//! 4. **Assembly**: [`crate::output::assemble`] concatenates the staged
//!    segments into the output file
//! 5. **Progress Tracking**: [`job::JobState`] and [`job::JobProgress`]
//!
//! # Quick Start
//!
//! ```no_run
//! use timeshift_recorder::downloader::{ExecutorSettings, JobExecutor};
//! use timeshift_recorder::schedule::ScheduleEntry;
//! use timeshift_recorder::session::{build_http_client, HttpSettings, RadikoSession, SessionConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = build_http_client(&HttpSettings::default())?;
//! let mut session = RadikoSession::new(client.clone(), SessionConfig::default());
//! let executor = JobExecutor::new(ExecutorSettings::new("./recordings"), client);
//!
//! let entry = ScheduleEntry::new("Late Night Talk", "火", "010000", "TBS");
//! let outcome = executor.execute(&mut session, &entry, chrono::Utc::now()).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Nothing is retried. A failed segment aborts the job with a
//! [`DownloadError`] naming the segment; the executor wraps it in a
//! [`job::JobError`] carrying the stage and the program.

pub mod config;
pub mod executor;
pub mod job;
pub mod progress;
pub mod segment;
pub mod workspace;

pub use config::ExecutorSettings;
pub use executor::{plan_job, JobExecutor, JobOutcome, RunSummary};
pub use job::{JobError, JobFailure, JobProgress, JobStage, JobState, RecordingJob};
pub use segment::{SegmentDownloader, StagedSegment};
pub use workspace::Workspace;

/// Why a single segment could not be staged
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentFailure {
    /// Request could not be sent or the body stream broke
    #[error("network error: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Local staging file could not be written
    #[error("write error: {0}")]
    Write(String),
}

/// Segment download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Segment at `index` failed; the batch was aborted
    #[error("failed to download segment {index} ({uri}): {reason}")]
    Segment {
        /// Zero-based position in the segment list
        index: usize,
        /// Segment URI
        uri: String,
        /// Failure cause
        reason: SegmentFailure,
    },

    /// Shutdown was requested before segment `index` was fetched
    #[error("download cancelled before segment {index}")]
    Cancelled {
        /// Next segment that would have been fetched
        index: usize,
    },
}

impl DownloadError {
    /// Index of the segment that failed, if any
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            Self::Segment { index, .. } => Some(*index),
            Self::Cancelled { .. } => None,
        }
    }

    /// URI of the segment that failed, if any
    pub fn failed_uri(&self) -> Option<&str> {
        match self {
            Self::Segment { uri, .. } => Some(uri),
            Self::Cancelled { .. } => None,
        }
    }
}

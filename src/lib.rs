//! # Timeshift Recorder Library
//!
//! Records the most recent broadcast of weekly radio programs from a
//! time-shift streaming service.
//!
//! ## Features
//!
//! - **Recurrence Resolution**: finds the latest past occurrence of a weekly
//!   slot, handling week wrap-around in a single fixed timezone (JST)
//! - **Time-Shift Sessions**: Radiko-style token exchange, program-guide
//!   lookup and playlist expansion behind a mockable capability trait
//! - **Ordered Segment Download**: one segment at a time into a per-job
//!   staging workspace; any failure aborts the job
//! - **Assembly**: byte-exact concatenation into one file per recording
//!
//! ## Quick Start
//!
//! ```no_run
//! use timeshift_recorder::downloader::{ExecutorSettings, JobExecutor};
//! use timeshift_recorder::schedule::load_schedule;
//! use timeshift_recorder::session::{build_http_client, HttpSettings, RadikoSession, SessionConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let entries = load_schedule("schedule.json")?;
//! let client = build_http_client(&HttpSettings::default())?;
//! let mut session = RadikoSession::new(client.clone(), SessionConfig::default());
//!
//! let executor = JobExecutor::new(ExecutorSettings::new("./output"), client);
//! let summary = executor
//!     .run_schedule(&mut session, &entries, chrono::Utc::now())
//!     .await;
//! println!("{} recorded, {} failed", summary.completed, summary.failed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`schedule`] - Schedule entries, the schedule file and recurrence resolution
//! - [`session`] - Streaming session capability and the Radiko client
//! - [`downloader`] - Job orchestration, segment download and staging
//! - [`output`] - Output naming and segment assembly
//! - [`config`] - On-disk configuration
//! - [`cli`] - Command-line interface

#![warn(missing_docs)]
#![warn(clippy::all)]

/// CLI command implementations
pub mod cli;

/// On-disk configuration
pub mod config;

/// Recording orchestration
pub mod downloader;

/// Observability metrics
pub mod metrics;

/// Output naming and assembly
pub mod output;

/// Schedule entries and recurrence resolution
pub mod schedule;

/// Streaming session capability
pub mod session;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

// Re-export commonly used types
pub use config::RecorderConfig;
pub use downloader::{JobExecutor, JobOutcome, RunSummary};
pub use schedule::{resolve, ScheduleEntry};
pub use session::StreamingSession;

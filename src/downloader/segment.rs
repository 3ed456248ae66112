//! Sequential segment downloader
//!
//! Segments are fetched strictly in playlist order, one request at a time.
//! Each body is streamed into its own freshly created staging file named by
//! its zero-padded index. The first failure aborts the batch.

use futures_util::StreamExt;
use indicatif::ProgressBar;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::config::{DEFAULT_EXTENSION, SEGMENT_INDEX_WIDTH};
use super::progress::ProgressTracker;
use super::{DownloadError, SegmentFailure};
use crate::metrics::SegmentRequestMetrics;
use crate::shutdown::{self, SharedShutdown};

/// A segment written to the staging workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedSegment {
    /// Zero-based position in the segment list
    pub index: usize,
    /// URI it was fetched from
    pub source_uri: String,
    /// Staging file
    pub path: PathBuf,
    /// Bytes written
    pub bytes: u64,
}

/// Staging file name of segment `index`.
pub fn segment_file_name(index: usize, extension: &str) -> String {
    format!("segment_{index:0width$}.{extension}", width = SEGMENT_INDEX_WIDTH)
}

/// Downloads a segment list into a workspace directory
#[derive(Debug, Clone)]
pub struct SegmentDownloader {
    client: Client,
    station: String,
    extension: String,
    shutdown: Option<SharedShutdown>,
    progress_tracker: ProgressTracker,
}

impl SegmentDownloader {
    /// Create a downloader using `client` for every request
    pub fn new(client: Client) -> Self {
        Self {
            client,
            station: String::from("unknown"),
            extension: DEFAULT_EXTENSION.to_string(),
            shutdown: None,
            progress_tracker: ProgressTracker::default(),
        }
    }

    /// Station label attached to logs and metrics
    pub fn for_station(mut self, station: impl Into<String>) -> Self {
        self.station = station.into();
        self
    }

    /// Extension of the staging files (with or without a leading dot)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Attach a shared shutdown handle, checked before every segment.
    pub fn with_shutdown(mut self, shutdown: Option<SharedShutdown>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Override progress tracking configuration.
    pub fn with_progress_tracker(mut self, tracker: ProgressTracker) -> Self {
        self.progress_tracker = tracker;
        self
    }

    /// Download every segment into `workspace`, in order.
    ///
    /// On success the returned list has one entry per input URI, at the same
    /// position. On failure nothing after the failing segment is fetched.
    pub async fn download(
        &self,
        segments: &[String],
        workspace: &Path,
        progress: Option<&ProgressBar>,
    ) -> Result<Vec<StagedSegment>, DownloadError> {
        let mut staged = Vec::with_capacity(segments.len());
        let mut state = self.progress_tracker.create_state(segments.len() as u64);

        for (index, uri) in segments.iter().enumerate() {
            if shutdown::is_requested(self.shutdown.as_ref()) {
                info!(index, "Shutdown requested - aborting segment download");
                return Err(DownloadError::Cancelled { index });
            }

            let path = workspace.join(segment_file_name(index, &self.extension));
            let bytes = self
                .fetch_segment(index, uri, &path)
                .await
                .map_err(|reason| DownloadError::Segment {
                    index,
                    uri: uri.clone(),
                    reason,
                })?;

            staged.push(StagedSegment {
                index,
                source_uri: uri.clone(),
                path,
                bytes,
            });

            if let Some(bar) = progress {
                bar.inc(1);
            }
            state.update(bytes);
            if state.should_emit_update() {
                info!(station = %self.station, "{}", state.format_progress());
                state.mark_emitted();
            }
        }

        debug!(
            segments = staged.len(),
            bytes = state.bytes_downloaded,
            "All segments staged"
        );
        Ok(staged)
    }

    async fn fetch_segment(&self, index: usize, uri: &str, path: &Path) -> Result<u64, SegmentFailure> {
        let metrics = SegmentRequestMetrics::start(&self.station, index).await;

        let response = match self.client.get(uri).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics.record_network_error();
                return Err(SegmentFailure::Transport(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            metrics.record_complete(status.as_u16(), 0);
            return Err(SegmentFailure::Status(status.as_u16()));
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| SegmentFailure::Write(format!("{}: {e}", path.display())))?;

        let mut written: u64 = 0;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    metrics.record_network_error();
                    return Err(SegmentFailure::Transport(e.to_string()));
                }
            };
            file.write_all(&chunk)
                .await
                .map_err(|e| SegmentFailure::Write(format!("{}: {e}", path.display())))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| SegmentFailure::Write(format!("{}: {e}", path.display())))?;

        metrics.record_complete(status.as_u16(), written);
        Ok(written)
    }
}

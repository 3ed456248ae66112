//! Progress tracking for segment downloads.
//!
//! A recording is a few hundred to a few thousand segments. This module
//! computes percentages and remaining-time estimates and formats the
//! `[PROGRESS]` lines the segment downloader logs while it works.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(30);
const MIN_DOWNLOAD_DURATION: Duration = Duration::from_secs(10);

/// Lightweight builder that controls update cadence.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    update_interval: Duration,
    min_percentage_step: f64,
}

impl ProgressTracker {
    /// Create a tracker with custom interval and percentage step.
    pub fn new(update_interval: Duration, min_percentage_step: f64) -> Self {
        Self {
            update_interval,
            min_percentage_step,
        }
    }

    /// Build a [`ProgressState`] configured with the tracker defaults.
    pub fn create_state(&self, total_segments: u64) -> ProgressState {
        let mut state = ProgressState::new(total_segments);
        state.update_interval = self.update_interval;
        state.min_percentage_step = self.min_percentage_step;
        state
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_UPDATE_INTERVAL, 10.0)
    }
}

/// Progress of one segment batch.
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// Segments staged so far.
    pub segments_downloaded: u64,
    /// Bytes staged so far.
    pub bytes_downloaded: u64,
    /// Segments in the batch.
    pub total_segments: u64,
    /// Timestamp when download started.
    pub start_time: Instant,
    /// Last time progress was reported.
    pub last_update: Instant,
    /// Minimum interval between progress updates.
    pub update_interval: Duration,
    /// Current rate in segments per second.
    pub current_rate: f64,
    /// Last reported completion percentage (0-100).
    pub last_reported_percentage: f64,
    /// Minimum percentage delta required to emit a new update.
    pub min_percentage_step: f64,
}

impl ProgressState {
    /// Create a new progress state with default intervals.
    pub fn new(total_segments: u64) -> Self {
        let now = Instant::now();
        Self {
            segments_downloaded: 0,
            bytes_downloaded: 0,
            total_segments,
            start_time: now,
            last_update: now,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            current_rate: 0.0,
            last_reported_percentage: 0.0,
            min_percentage_step: 10.0,
        }
    }

    /// Record one more staged segment of `bytes` bytes.
    pub fn update(&mut self, bytes: u64) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        self.segments_downloaded = self.segments_downloaded.saturating_add(1);
        self.bytes_downloaded = self.bytes_downloaded.saturating_add(bytes);
        if elapsed > 0.0 {
            self.current_rate = self.segments_downloaded as f64 / elapsed;
        }
    }

    /// Whether a progress update should be emitted based on time or percentage.
    pub fn should_emit_update(&self) -> bool {
        if self.segments_downloaded == 0 {
            return false;
        }

        if self.percentage() - self.last_reported_percentage >= self.min_percentage_step {
            return true;
        }

        self.start_time.elapsed() >= MIN_DOWNLOAD_DURATION
            && self.last_update.elapsed() >= self.update_interval
    }

    /// Call after emitting a progress log to reset timers and cached percentage.
    pub fn mark_emitted(&mut self) {
        self.last_update = Instant::now();
        self.last_reported_percentage = self.percentage();
    }

    /// Completion percentage (0-100). An empty batch counts as complete.
    pub fn percentage(&self) -> f64 {
        if self.total_segments == 0 {
            return 100.0;
        }
        (self.segments_downloaded as f64 / self.total_segments as f64) * 100.0
    }

    /// Estimate remaining time from the current rate.
    pub fn estimate_remaining(&self) -> Option<Duration> {
        if self.current_rate <= 0.0 {
            return None;
        }
        let remaining = self.total_segments.saturating_sub(self.segments_downloaded);
        if remaining == 0 {
            return None;
        }
        Some(Duration::from_secs_f64(remaining as f64 / self.current_rate))
    }

    /// Human-readable progress string for logging.
    pub fn format_progress(&self) -> String {
        let mut parts = vec![format!(
            "[PROGRESS] Downloaded {}/{} segments ({})",
            self.segments_downloaded,
            self.total_segments,
            format_bytes(self.bytes_downloaded)
        )];

        parts.push(format!("- {:.1}% complete", self.percentage()));

        if self.current_rate > 0.0 {
            parts.push(format!("at {:.1} segments/sec", self.current_rate));
        }

        if let Some(remaining) = self.estimate_remaining() {
            parts.push(format!("- ~{} remaining", format_duration(remaining)));
        }

        parts.join(" ")
    }
}

/// Create a terminal progress bar for a batch of `total_segments`.
pub fn create_progress_bar(total_segments: u64, message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new(total_segments);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );
    pb.set_message(message.into());
    pb
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{:.1}h", secs as f64 / 3600.0)
    }
}

/// Format a byte count with a binary unit suffix.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

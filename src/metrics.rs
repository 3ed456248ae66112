//! Recording metrics
//!
//! Counters and histograms for segment requests and recording jobs.
//!
//! ## Architecture
//!
//! - Uses `metrics` crate for low-overhead metric collection
//! - Optional Prometheus exporter for a scrape endpoint (`--metrics-addr`)
//! - Without an installed recorder every macro is a no-op

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Correlation ID generator for request tracing
static CORRELATION_COUNTER: Lazy<Arc<RwLock<u64>>> = Lazy::new(|| Arc::new(RwLock::new(0)));

/// Metrics initialization errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Prometheus exporter could not be installed
    #[error("failed to install Prometheus exporter: {0}")]
    Install(String),
}

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: later calls return `Ok(())` without rebinding.
///
/// # Arguments
/// * `addr` - Socket address to bind the scrape endpoint (e.g., "0.0.0.0:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_counter!(
        "segment_requests_total",
        Unit::Count,
        "Total number of segment requests, by status"
    );

    describe_histogram!(
        "segment_request_duration_seconds",
        Unit::Seconds,
        "Segment request duration in seconds, body included"
    );

    describe_counter!(
        "segment_bytes_total",
        Unit::Bytes,
        "Total bytes of audio staged"
    );

    describe_counter!(
        "recordings_completed_total",
        Unit::Count,
        "Total number of recordings assembled"
    );

    describe_counter!(
        "recordings_failed_total",
        Unit::Count,
        "Total number of failed recordings, by stage"
    );

    describe_counter!(
        "recordings_skipped_total",
        Unit::Count,
        "Total number of recordings skipped because the output existed"
    );

    describe_histogram!(
        "recording_duration_seconds",
        Unit::Seconds,
        "Wall-clock time of successful recording jobs"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Generate a new correlation ID for request tracing
pub async fn generate_correlation_id() -> String {
    let mut counter = CORRELATION_COUNTER.write().await;
    *counter += 1;
    format!("seg-{:08x}", *counter)
}

/// Timing and outcome of one segment request
pub struct SegmentRequestMetrics {
    station: String,
    index: usize,
    start_time: Instant,
    correlation_id: String,
}

impl SegmentRequestMetrics {
    /// Start recording a segment request
    pub async fn start(station: impl Into<String>, index: usize) -> Self {
        let station = station.into();
        let correlation_id = generate_correlation_id().await;

        debug!(
            correlation_id = %correlation_id,
            station = %station,
            index = index,
            "Starting segment request"
        );

        Self {
            station,
            index,
            start_time: Instant::now(),
            correlation_id,
        }
    }

    /// Record a completed request with its status and staged size
    pub fn record_complete(&self, status_code: u16, bytes: u64) {
        let duration = self.start_time.elapsed();

        counter!(
            "segment_requests_total",
            "station" => self.station.clone(),
            "status" => status_code.to_string(),
        )
        .increment(1);

        histogram!(
            "segment_request_duration_seconds",
            "station" => self.station.clone(),
        )
        .record(duration.as_secs_f64());

        if bytes > 0 {
            counter!("segment_bytes_total", "station" => self.station.clone()).increment(bytes);
        }

        debug!(
            correlation_id = %self.correlation_id,
            index = self.index,
            status = status_code,
            bytes = bytes,
            duration_ms = duration.as_millis(),
            "Segment request completed"
        );
    }

    /// Record a network error (no status code)
    pub fn record_network_error(&self) {
        let duration = self.start_time.elapsed();

        counter!(
            "segment_requests_total",
            "station" => self.station.clone(),
            "status" => "network_error",
        )
        .increment(1);

        histogram!(
            "segment_request_duration_seconds",
            "station" => self.station.clone(),
        )
        .record(duration.as_secs_f64());

        warn!(
            correlation_id = %self.correlation_id,
            index = self.index,
            duration_ms = duration.as_millis(),
            "Segment network error recorded"
        );
    }

    /// Get the correlation ID for this request
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

/// Recording job metrics
pub struct RecordingMetrics {
    station: String,
    program: String,
    start_time: Instant,
}

impl RecordingMetrics {
    /// Start tracking a recording job
    pub fn start(station: impl Into<String>, program: impl Into<String>) -> Self {
        let station = station.into();
        let program = program.into();

        debug!(station = %station, program = %program, "Recording metrics started");

        Self {
            station,
            program,
            start_time: Instant::now(),
        }
    }

    /// Record an assembled recording
    pub fn record_success(&self, segments: usize, bytes: u64) {
        let duration = self.start_time.elapsed();

        counter!(
            "recordings_completed_total",
            "station" => self.station.clone(),
        )
        .increment(1);

        histogram!(
            "recording_duration_seconds",
            "station" => self.station.clone(),
        )
        .record(duration.as_secs_f64());

        info!(
            station = %self.station,
            program = %self.program,
            segments = segments,
            bytes = bytes,
            duration_secs = duration.as_secs(),
            "Recording completed successfully"
        );
    }

    /// Record a skipped recording
    pub fn record_skipped(&self) {
        counter!(
            "recordings_skipped_total",
            "station" => self.station.clone(),
        )
        .increment(1);
    }

    /// Record a failed recording
    pub fn record_failure(&self, stage: &str, error: &str) {
        let duration = self.start_time.elapsed();

        counter!(
            "recordings_failed_total",
            "station" => self.station.clone(),
            "stage" => stage.to_string(),
        )
        .increment(1);

        error!(
            station = %self.station,
            program = %self.program,
            stage = %stage,
            error = %error,
            duration_secs = duration.as_secs(),
            "Recording failed"
        );
    }
}

//! Output path generation
//!
//! Recordings land flat in the output directory, one file per occurrence:
//! `{output_dir}/{YYYYMMDDHHMMSS}-{station}-{program}.{ext}`, with the
//! timestamp in the reference timezone.
//!
//! # Usage Example
//!
//! ```rust
//! use timeshift_recorder::output::OutputPathBuilder;
//! use chrono::DateTime;
//! use std::path::PathBuf;
//!
//! let occurrence = DateTime::parse_from_rfc3339("2026-01-13T01:00:00+09:00").unwrap();
//! let path = OutputPathBuilder::new(PathBuf::from("output"), occurrence, "TBS", "Late Night Talk")
//!     .build()
//!     .unwrap();
//! assert_eq!(path, PathBuf::from("output/20260113010000-TBS-Late Night Talk.aac"));
//! ```

use super::{OutputError, OutputResult};
use crate::downloader::config::DEFAULT_EXTENSION;
use crate::schedule::reference_offset;
use chrono::{DateTime, TimeZone};
use std::path::PathBuf;

/// Timestamp layout of output file names
pub const OCCURRENCE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Path builder for recording files
#[derive(Debug, Clone)]
pub struct OutputPathBuilder {
    root_dir: PathBuf,
    occurrence: String,
    station: String,
    program: String,
    extension: String,
}

impl OutputPathBuilder {
    /// Create a new path builder
    ///
    /// # Arguments
    ///
    /// * `root_dir` - Output directory (e.g., "output" or "/var/recordings")
    /// * `occurrence` - Broadcast start; any timezone, rendered in JST
    /// * `station` - Station identifier (e.g., "TBS")
    /// * `program` - Program name
    ///
    /// Station and program are sanitized to prevent path traversal.
    /// Characters `/`, `\`, `:` and the sequence `..` are replaced with `_`.
    pub fn new<Tz: TimeZone>(
        root_dir: PathBuf,
        occurrence: DateTime<Tz>,
        station: &str,
        program: &str,
    ) -> Self {
        Self {
            root_dir,
            occurrence: format_occurrence(&occurrence),
            station: sanitize_component(station),
            program: sanitize_component(program),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Set the file extension (with or without a leading dot)
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// File name without the directory
    pub fn file_name(&self) -> OutputResult<String> {
        if self.extension.is_empty()
            || self.extension.contains(['/', '\\'])
            || self.extension.contains("..")
        {
            return Err(OutputError::InvalidExtension(self.extension.clone()));
        }
        Ok(format!(
            "{}-{}-{}.{}",
            self.occurrence, self.station, self.program, self.extension
        ))
    }

    /// Build the complete file path
    pub fn build(&self) -> OutputResult<PathBuf> {
        Ok(self.root_dir.join(self.file_name()?))
    }
}

/// Render an occurrence as `YYYYMMDDHHMMSS` in the reference timezone.
pub fn format_occurrence<Tz: TimeZone>(occurrence: &DateTime<Tz>) -> String {
    occurrence
        .with_timezone(&reference_offset())
        .format(OCCURRENCE_FORMAT)
        .to_string()
}

/// Sanitize a file name component for filesystem safety
///
/// - `/`, `\`, `:` → `_` (directory and drive separators)
/// - `..` → `__` (parent directory reference)
///
/// Preserves case and non-ASCII characters.
fn sanitize_component(name: &str) -> String {
    name.replace("..", "__").replace(['/', '\\', ':'], "_")
}

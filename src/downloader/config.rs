//! Recording configuration constants and executor settings

use std::path::PathBuf;

/// Default TCP connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default per-request timeout in seconds.
/// A single AAC segment is a few seconds of audio, so a minute is generous
/// even on slow links.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default extension of staged segments and the assembled output.
pub const DEFAULT_EXTENSION: &str = "aac";

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Digits used for staged segment indices.
/// Six digits keep lexical and numeric order identical up to 999,999
/// segments (several weeks of 5-second chunks).
pub const SEGMENT_INDEX_WIDTH: usize = 6;

/// Prefix of per-job staging directories.
pub const WORKSPACE_PREFIX: &str = "timeshift-segments-";

/// Settings handed to the executor at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    /// Directory receiving assembled recordings
    pub output_dir: PathBuf,
    /// Extension of segments and output (without the dot)
    pub extension: String,
    /// Parent of staging workspaces (`None` = OS temp dir)
    pub temp_root: Option<PathBuf>,
    /// Re-record even if the output already exists
    pub force: bool,
}

impl ExecutorSettings {
    /// Settings writing into `output_dir` with defaults otherwise
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Set the file extension (with or without a leading dot)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Set the staging root
    pub fn with_temp_root(mut self, temp_root: Option<PathBuf>) -> Self {
        self.temp_root = temp_root;
        self
    }

    /// Enable or disable forced re-recording
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
            temp_root: None,
            force: false,
        }
    }
}

//! Recording output: file naming and segment assembly

use std::path::PathBuf;

pub mod assemble;
pub mod path;

pub use assemble::assemble;
pub use path::{format_occurrence, OutputPathBuilder};

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Assembly was asked to produce a recording from zero segments
    #[error("no segments to assemble")]
    NoSegments,

    /// Output directory could not be created
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        /// Directory path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Output file could not be created (it may already exist)
    #[error("failed to create output file {}: {source}", path.display())]
    CreateOutput {
        /// Output path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// A staged segment could not be opened
    #[error("failed to open segment {}: {source}", path.display())]
    OpenSegment {
        /// Segment path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Copying a staged segment into the output failed
    #[error("failed to copy segment {}: {source}", path.display())]
    Copy {
        /// Segment path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Other IO failure on the output file
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// File extension is empty or contains path separators
    #[error("invalid file extension: '{0}'")]
    InvalidExtension(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

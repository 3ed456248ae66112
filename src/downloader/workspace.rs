//! Per-job staging workspace
//!
//! Every job stages its segments in a fresh temporary directory. The
//! directory is removed when the [`Workspace`] is dropped, whichever way the
//! job ends; a failed removal is logged and otherwise ignored.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};
use tracing::{debug, warn};

use super::config::WORKSPACE_PREFIX;

/// Temporary staging directory owned by one job
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Create a workspace under `root`, or the OS temp dir if `None`.
    pub fn create(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "Created staging workspace");

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Workspace directory
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => debug!(path = %self.path.display(), "Removed staging workspace"),
                Err(e) => warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove staging workspace"
                ),
            }
        }
    }
}

//! Graceful shutdown coordination.
//!
//! A [`ShutdownCoordinator`] is created once in `main`, wired to Ctrl+C, and
//! passed explicitly to the executor and the segment downloader. Both poll it
//! between units of work so an interrupted job stops before the next segment
//! and still removes its staging workspace.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared handle to a shutdown coordinator.
pub type SharedShutdown = Arc<ShutdownCoordinator>;

/// Coordinates graceful shutdown across async tasks.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    is_shutdown: AtomicBool,
}

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self {
            is_shutdown: AtomicBool::new(false),
        }
    }

    /// Create a new shared coordinator wrapped in [`Arc`].
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::new())
    }

    /// Request shutdown. Later requests are no-ops.
    pub fn request_shutdown(&self) {
        self.is_shutdown.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }
}

/// Whether an optional shutdown handle has been triggered.
pub fn is_requested(shutdown: Option<&SharedShutdown>) -> bool {
    shutdown.is_some_and(|s| s.is_shutdown_requested())
}

//! Progress reporting side channel.
//!
//! Observers are told how many bytes have moved; they cannot influence the
//! transfer, and a transfer behaves the same with or without one.

use sft_core::{Direction, Progress};

/// Receives transfer progress updates.
pub trait ProgressObserver: Send + Sync {
    /// Called after each block or chunk has been transferred.
    fn on_progress(&self, direction: Direction, progress: Progress);
}

/// Observer that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _direction: Direction, _progress: Progress) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(Direction, Progress) + Send + Sync,
{
    fn on_progress(&self, direction: Direction, progress: Progress) {
        self(direction, progress)
    }
}

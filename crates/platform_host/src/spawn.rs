//! Fire-and-forget task spawning seam for background persistence.

use futures::future::LocalBoxFuture;

/// Spawns `!Send` futures onto the host event loop without awaiting them.
pub trait TaskSpawner {
    /// Schedules `task` to run to completion. Callers never observe its result.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

#[derive(Debug, Clone, Copy, Default)]
/// Runs each task to completion on the calling thread before returning.
///
/// Used on host targets and in tests, where there is no browser event loop to hand work to.
pub struct InlineSpawner;

impl TaskSpawner for InlineSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        futures::executor::block_on(task);
    }
}

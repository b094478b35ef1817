//! Scoped ownership of a background task.

use super::CancellationToken;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Owns one spawned task for as long as the lease is held.
///
/// Dropping the lease cancels the task's token and aborts the task, so every
/// exit path of the owner releases it.
pub struct TaskLease {
    name: String,
    token: Arc<CancellationToken>,
    handle: JoinHandle<()>,
}

impl TaskLease {
    /// Spawns a task that receives the lease's cancellation token.
    pub fn spawn<F, Fut>(name: impl Into<String>, task: F) -> Self
    where
        F: FnOnce(Arc<CancellationToken>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = Arc::new(CancellationToken::new());
        let handle = tokio::spawn(task(Arc::clone(&token)));

        Self {
            name: name.into(),
            token,
            handle,
        }
    }

    /// Returns true while the task is running and has not been cancelled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }

    /// Returns the lease name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Releases the lease with a reason.
    pub fn release(self, reason: &str) {
        self.token.cancel(reason);
    }
}

impl Drop for TaskLease {
    fn drop(&mut self) {
        if self.token.cancel("lease dropped") {
            debug!(lease = %self.name, "released task lease");
        }
        self.handle.abort();
    }
}

impl std::fmt::Debug for TaskLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskLease")
            .field("name", &self.name)
            .field("active", &self.is_active())
            .finish()
    }
}

//! Background task and in-flight work tracking.
//!
//! Background tasks are spawned through a [`Lifecycle`] so they observe one
//! shared shutdown signal, and request handling holds an [`InFlight`] guard so
//! shutdown can wait for the outstanding count to reach zero before the store
//! connection is released.

use std::{future::Future, time::Duration};

use tokio_util::{
    sync::CancellationToken,
    task::{TaskTracker, task_tracker::TaskTrackerToken},
};
use tracing::{Instrument, info, info_span, warn};

/// Guard counted as outstanding work until dropped.
pub type InFlight = TaskTrackerToken;

#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to the shared shutdown signal.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Spawn a tracked background task.
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks
            .spawn(task.instrument(info_span!("background", task = name)));
    }

    /// Register one unit of in-flight work.
    #[must_use]
    pub fn track(&self) -> InFlight {
        self.tasks.token()
    }

    /// Number of background tasks and in-flight guards still alive.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }

    /// Signal shutdown and wait up to `grace` for all tracked work to finish.
    /// Returns `false` when the grace period elapsed with work still running.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.shutdown.cancel();
        self.tasks.close();

        info!(outstanding = self.outstanding(), "waiting for tracked work to drain");

        if tokio::time::timeout(grace, self.tasks.wait()).await.is_ok() {
            info!("tracked work drained");

            return true;
        }

        warn!(
            outstanding = self.outstanding(),
            grace_ms = grace.as_millis(),
            "grace period elapsed before tracked work drained"
        );

        false
    }
}

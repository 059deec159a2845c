//! FIFO dispatch queue with a fixed inter-request gap
//!
//! Burst concurrent calls (several screens fetching at once) become a
//! gentle one-at-a-time stream, trading latency for staying under upstream
//! rate limits. The gap is a fixed, non-adaptive delay.
//!
//! A single consumer task reads jobs off an unbounded channel and runs them
//! to completion one by one; each caller is settled through a oneshot
//! carrying the task's own outcome.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::{Error, Result};

/// Default gap between the completion of one task and the start of the next
pub const DEFAULT_DISPATCH_DELAY: Duration = Duration::from_millis(100);

type Job = BoxFuture<'static, ()>;

/// Serialized task queue
///
/// Must be created inside a Tokio runtime: `new` spawns the consumer task.
/// Dropping the queue closes the channel; the consumer drains whatever is
/// already queued, then exits.
pub struct SerialQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl SerialQueue {
    /// Create a queue whose consumer waits `delay` between tasks
    pub fn new(delay: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        tokio::spawn(async move {
            debug!("dispatch worker started");
            while let Some(job) = rx.recv().await {
                // Success and failure are both awaited; the outcome belongs
                // to the caller's oneshot, not to the drain loop.
                job.await;
                tokio::time::sleep(delay).await;
            }
            debug!("dispatch worker stopped");
        });

        Self { tx }
    }

    /// Create a queue with the default gap
    pub fn with_default_delay() -> Self {
        Self::new(DEFAULT_DISPATCH_DELAY)
    }

    /// Enqueue a task and return a future settling with its outcome
    ///
    /// The task is appended to the queue immediately, at call time; the
    /// returned future resolves only once the task has actually run. The
    /// queue never inspects the task's output.
    pub fn run<T, F, Fut>(&self, task: F) -> impl Future<Output = Result<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (settle, outcome) = oneshot::channel::<T>();

        let job: Job = Box::pin(async move {
            let result = task().await;
            // The caller may have gone away; nobody else wants the result.
            let _ = settle.send(result);
        });

        let enqueued = self
            .tx
            .send(job)
            .map_err(|_| Error::dispatch("dispatch worker is gone"));

        async move {
            enqueued?;
            outcome
                .await
                .map_err(|_| Error::dispatch("dispatch worker dropped before running the task"))
        }
    }
}

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

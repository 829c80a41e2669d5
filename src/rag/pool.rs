//! Worker pool for dispatched retrieval work
//!
//! The augmentor never spawns on its own: every task that leaves the
//! caller's context goes through a [`WorkerPool`] handed to it at build
//! time. This keeps the pool swappable and lets tests count submissions.
//!
//! - `TokioWorkerPool::ambient()` spawns onto whatever runtime drives the
//!   `augment()` call (the default)
//! - `TokioWorkerPool::dedicated()` owns a multi-thread runtime tuned for
//!   short, bursty, I/O-bound work: each task gets a thread from the
//!   runtime's elastic blocking pool, and threads idle for longer than
//!   `keep_alive_ms` exit. The async workers only drive I/O and timers.
//!
//! [`dispatch`] submits a fallible future and returns a [`TaskHandle`];
//! [`gather`] joins handles and fails on the first error. Handles that are
//! dropped do not cancel their task, the result is simply discarded.

use futures_util::future::{try_join_all, BoxFuture};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::config::PoolConfig;
use crate::errors::{RagError, Result};

/// Accepts fire-and-forget tasks from any number of concurrent callers
pub trait WorkerPool: Send + Sync {
    fn submit(&self, task: BoxFuture<'static, ()>);
}

impl<P: WorkerPool + ?Sized> WorkerPool for Arc<P> {
    fn submit(&self, task: BoxFuture<'static, ()>) {
        (**self).submit(task)
    }
}

/// Tokio-backed worker pool
pub struct TokioWorkerPool {
    target: SpawnTarget,
}

enum SpawnTarget {
    Ambient,
    Dedicated {
        handle: Handle,
        _runtime: RuntimeGuard,
    },
}

/// Shuts the owned runtime down without blocking the dropping thread
struct RuntimeGuard(Option<Runtime>);

impl Drop for RuntimeGuard {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

impl TokioWorkerPool {
    /// Spawn onto the runtime of the submitting task
    ///
    /// Submitting outside a Tokio runtime drops the task; its handle then
    /// resolves to [`RagError::TaskAborted`].
    pub fn ambient() -> Self {
        Self {
            target: SpawnTarget::Ambient,
        }
    }

    /// Build a pool with its own multi-thread runtime
    pub fn dedicated(config: &PoolConfig) -> Result<Self> {
        config.validate()?;

        let threads = config.effective_worker_threads();
        let runtime = Builder::new_multi_thread()
            .worker_threads(threads)
            .thread_name(config.thread_name.clone())
            .thread_keep_alive(Duration::from_millis(config.keep_alive_ms))
            .enable_all()
            .build()?;

        debug!(
            worker_threads = threads,
            keep_alive_ms = config.keep_alive_ms,
            "Dedicated worker pool started"
        );

        Ok(Self {
            target: SpawnTarget::Dedicated {
                handle: runtime.handle().clone(),
                _runtime: RuntimeGuard(Some(runtime)),
            },
        })
    }
}

impl Default for TokioWorkerPool {
    fn default() -> Self {
        Self::ambient()
    }
}

impl WorkerPool for TokioWorkerPool {
    fn submit(&self, task: BoxFuture<'static, ()>) {
        match &self.target {
            SpawnTarget::Ambient => match Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(task);
                }
                Err(err) => {
                    warn!(error = %err, "No Tokio runtime to run the task on, dropping it");
                }
            },
            SpawnTarget::Dedicated { handle, .. } => {
                // Blocking-pool threads are reclaimed after keep-alive
                let runner = handle.clone();
                handle.spawn_blocking(move || runner.block_on(task));
            }
        }
    }
}

/// Result of a dispatched task
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<Result<T>>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.receiver).poll(cx).map(|received| match received {
            Ok(result) => result,
            Err(_) => Err(RagError::TaskAborted(
                "task ended without reporting a result".to_string(),
            )),
        })
    }
}

/// Submit `task` to `pool` now and return a handle to its result
pub fn dispatch<T, F>(pool: &dyn WorkerPool, task: F) -> TaskHandle<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    pool.submit(Box::pin(async move {
        // Receiver is gone when a sibling already failed the call
        let _ = sender.send(task.await);
    }));
    TaskHandle { receiver }
}

/// Wait for every handle; the first error wins
pub async fn gather<T>(handles: Vec<TaskHandle<T>>) -> Result<Vec<T>> {
    try_join_all(handles).await
}

//! Task-per-call pool with an optional concurrency bound.
//!
//! Every admitted call runs on its own Tokio task, so a slow call never stalls
//! another call or the liveness probe. The pool counts in-flight calls and
//! drives the three shutdown phases: refuse new calls, drain in-flight calls
//! within a grace period, then terminate whatever is left.
//!
//! Without a configured bound the pool admits any number of calls and never
//! queues. That matches the service contract but offers no protection against
//! load spikes; set `max_concurrent_calls` to reject calls beyond a limit.

use super::guard::CallGuard;
use core::future::Future;
use core::time::Duration;
use logical_core::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

/// Polling interval while waiting for in-flight calls to drain.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Spawns and tracks the task of every in-flight call.
#[derive(Debug)]
pub struct CallPool {
    inflight: Arc<AtomicUsize>,
    closed: AtomicBool,
    limit: Option<usize>,
    terminate_token: CancellationToken,
}

impl CallPool {
    /// Creates a pool. `limit` of `None` means unbounded.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            inflight: Arc::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
            limit,
            terminate_token: CancellationToken::new(),
        }
    }

    /// Number of calls currently running.
    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Acquire)
    }

    /// The configured concurrency bound, if any.
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn admit(&self) -> Result<CallGuard, Error> {
        if self.is_closed() {
            return Err(Error::ServiceShutdown);
        }

        let (guard, previous) = CallGuard::enter(&self.inflight);

        if let Some(limit) = self.limit {
            if previous >= limit {
                return Err(Error::Overloaded { limit });
            }
        }

        // `close` may have raced the increment; the drain must not miss a call
        // admitted after it looked.
        if self.is_closed() {
            return Err(Error::ServiceShutdown);
        }

        Ok(guard)
    }

    /// Runs `work` on its own task and waits for its output.
    ///
    /// # Errors
    ///
    /// - [`Error::ServiceShutdown`] if the pool is closed.
    /// - [`Error::Overloaded`] if the concurrency bound is reached.
    /// - [`Error::CallTerminated`] if the pool was terminated while the call
    ///   was running.
    /// - [`Error::CallPanicked`] if the task panicked.
    pub async fn spawn<F, T>(&self, work: F) -> Result<T, Error>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let guard = self.admit()?;
        if self.terminate_token.is_cancelled() {
            return Err(Error::CallTerminated);
        }

        let task = tokio::spawn(async move {
            let _guard = guard;
            work.await
        });
        let abort = task.abort_handle();

        tokio::select! {
            biased;
            res = task => res.map_err(|e| {
                if e.is_cancelled() {
                    Error::CallTerminated
                } else {
                    Error::CallPanicked { context: e.to_string() }
                }
            }),
            () = self.terminate_token.cancelled() => {
                abort.abort();
                Err(Error::CallTerminated)
            }
        }
    }

    /// Stops admitting new calls. Calls already running are unaffected.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Waits up to `grace` for in-flight calls to finish.
    ///
    /// Returns `true` if the pool drained in time.
    pub async fn drain(&self, grace: Duration) -> bool {
        timeout(grace, async {
            while self.inflight() > 0 {
                sleep(DRAIN_POLL_INTERVAL).await;
            }
        })
        .await
        .is_ok()
    }

    /// Aborts every running call. Their callers receive
    /// [`Error::CallTerminated`] instead of a reply.
    pub fn terminate(&self) {
        self.terminate_token.cancel();
    }
}

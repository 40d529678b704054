use crate::server::telemetry::{decrement_calls_inflight, increment_calls_inflight};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Marks one call as in flight for as long as it lives.
///
/// The guard is moved into the spawned call task, so the count drops when the
/// task finishes, is aborted, or is detached by a client disconnect and later
/// completes on its own.
#[derive(Debug)]
pub struct CallGuard {
    inflight: Arc<AtomicUsize>,
}

impl CallGuard {
    /// Registers a new in-flight call and returns the previous count.
    pub(super) fn enter(inflight: &Arc<AtomicUsize>) -> (Self, usize) {
        let previous = inflight.fetch_add(1, Ordering::AcqRel);
        increment_calls_inflight();
        (
            Self {
                inflight: Arc::clone(inflight),
            },
            previous,
        )
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.inflight.fetch_sub(1, Ordering::AcqRel);
        decrement_calls_inflight();
    }
}

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex, PoisonError,
    },
    time::Duration,
};

use thiserror::Error;

/// Returned by any wait that gave up because its token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

struct Inner {
    cancelled: AtomicBool,
    sleepers: Mutex<()>,
    cond_var: Condvar,
}

/// Shared stop flag handed to every consumer. Cloning yields another
/// handle to the same flag.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                sleepers: Mutex::new(()),
                cond_var: Condvar::new(),
            }),
        }
    }

    /// Fires the token and wakes anyone parked in [`CancelToken::sleep`].
    ///
    /// Threads blocked on a permit are not woken here; the owner of the
    /// permit has to notify them (see `CountingPermit::wake_all`).
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        let _guard = self
            .inner
            .sleepers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.cond_var.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Sleeps for `duration` unless the token fires first.
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let guard = self
            .inner
            .sleepers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (_guard, _timeout) = self
            .inner
            .cond_var
            .wait_timeout_while(guard, duration, |_| !self.is_cancelled())
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

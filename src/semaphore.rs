use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::cancel::{CancelToken, Cancelled};

/// Counting semaphore. `acquire` blocks while the count is zero, then
/// decrements; `release` increments and wakes waiters.
pub struct CountingPermit {
    value: Mutex<usize>,
    cond_var: Condvar,
}

impl CountingPermit {
    pub fn new(value: usize) -> Self {
        Self {
            value: Mutex::new(value),
            cond_var: Condvar::new(),
        }
    }

    // The count stays consistent across a panic elsewhere, so poisoning is ignored.
    fn count(&self) -> MutexGuard<'_, usize> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn acquire(&self) {
        let mut guard = self.count();
        while *guard == 0 {
            guard = self
                .cond_var
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *guard -= 1;
    }

    /// Like [`CountingPermit::acquire`], but gives up with [`Cancelled`] once
    /// `token` has fired. A cancelled call leaves the count untouched.
    ///
    /// The token is checked while holding the count lock, so a canceller
    /// that fires the token and then calls [`CountingPermit::wake_all`] can
    /// never slip between the check and the wait.
    pub fn acquire_or_cancel(&self, token: &CancelToken) -> Result<(), Cancelled> {
        let mut guard = self.count();
        loop {
            if token.is_cancelled() {
                return Err(Cancelled);
            }
            if *guard > 0 {
                *guard -= 1;
                return Ok(());
            }
            guard = self
                .cond_var
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn release(&self) {
        *self.count() += 1;
        self.cond_var.notify_all();
    }

    /// Wakes every waiter without handing out a permit.
    pub fn wake_all(&self) {
        let _guard = self.count();
        self.cond_var.notify_all();
    }

    /// Snapshot of the count. Never waits for a permit, but the value can be
    /// stale by the time the caller looks at it.
    pub fn available(&self) -> usize {
        *self.count()
    }
}

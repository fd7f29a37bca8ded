use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// A consumer died before the target was reached, so it never will be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a consumer panicked before every item was processed")]
pub struct Abandoned;

struct State {
    done: u64,
    abandoned: bool,
}

/// Counts items that consumers have fully processed, so the orchestrator
/// can sleep until a target is reached instead of polling the buffer.
pub struct CompletionLatch {
    state: Mutex<State>,
    cond_var: Condvar,
}

impl CompletionLatch {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                done: 0,
                abandoned: false,
            }),
            cond_var: Condvar::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self) {
        self.state().done += 1;
        self.cond_var.notify_all();
    }

    /// Releases every waiter with [`Abandoned`].
    pub fn abandon(&self) {
        self.state().abandoned = true;
        self.cond_var.notify_all();
    }

    pub fn is_abandoned(&self) -> bool {
        self.state().abandoned
    }

    pub fn wait_for(&self, target: u64) -> Result<(), Abandoned> {
        let mut guard = self.state();
        while guard.done < target {
            if guard.abandoned {
                return Err(Abandoned);
            }
            guard = self
                .cond_var
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Ok(())
    }

    pub fn completed(&self) -> u64 {
        self.state().done
    }
}

/// Abandons the latch if dropped while the owning thread is unwinding.
pub struct AbandonOnPanic<'a>(pub &'a CompletionLatch);

impl Drop for AbandonOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.abandon();
        }
    }
}

impl Default for CompletionLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn test_wait_returns_once_target_reached() {
        let latch = Arc::new(CompletionLatch::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let latch = Arc::clone(&latch);
                thread::spawn(move || {
                    for _ in 0..25 {
                        latch.record();
                    }
                })
            })
            .collect();

        latch.wait_for(100).unwrap();
        assert_eq!(latch.completed(), 100);
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_zero_target_does_not_block() {
        assert_eq!(CompletionLatch::new().wait_for(0), Ok(()));
    }

    #[test]
    fn test_abandon_releases_waiter() {
        let latch = Arc::new(CompletionLatch::new());
        let waiter = {
            let latch = Arc::clone(&latch);
            thread::spawn(move || latch.wait_for(10))
        };
        latch.record();
        latch.abandon();
        assert_eq!(waiter.join().unwrap(), Err(Abandoned));
        assert!(latch.is_abandoned());
    }

    #[test]
    fn test_guard_abandons_only_on_panic() {
        let latch = Arc::new(CompletionLatch::new());
        {
            let _guard = AbandonOnPanic(&latch);
        }
        assert!(!latch.is_abandoned());

        let panicking = Arc::clone(&latch);
        let result = thread::spawn(move || {
            let _guard = AbandonOnPanic(&panicking);
            panic!("consumer failed");
        })
        .join();
        assert!(result.is_err());
        assert!(latch.is_abandoned());
    }
}

use std::{
    cell::UnsafeCell,
    ops::{Deref, DerefMut},
};

use std_semaphore::{Semaphore, SemaphoreGuard};

/// Mutual-exclusion permit: a semaphore with a single permit guarding `T`.
pub struct PermitLock<T> {
    permit: Semaphore,
    value: UnsafeCell<T>,
}

unsafe impl<T> Send for PermitLock<T> where T: Send {}
unsafe impl<T> Sync for PermitLock<T> where T: Send {}

impl<T> PermitLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            permit: Semaphore::new(1),
            value: UnsafeCell::new(value),
        }
    }

    /// Blocks until the single permit is free. The permit is handed back
    /// when the guard drops.
    pub fn lock(&self) -> LockGuard<'_, T> {
        LockGuard {
            lock: self,
            _permit: self.permit.access(),
        }
    }
}

pub struct LockGuard<'a, T> {
    lock: &'a PermitLock<T>,
    _permit: SemaphoreGuard<'a>,
}

impl<T> Deref for LockGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        // The guard holds the only permit, so no other reference exists.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for LockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.lock.value.get() }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_lock_serializes_increments() {
        let lock = PermitLock::new(0usize);
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        let mut guard = lock.lock();
                        let seen = *guard;
                        thread::yield_now();
                        *guard = seen + 1;
                    }
                });
            }
        });
        assert_eq!(*lock.lock(), 8000);
    }

    #[test]
    fn test_guard_drop_releases_permit() {
        let lock = PermitLock::new(vec![1, 2]);
        {
            let mut guard = lock.lock();
            guard.push(3);
        }
        lock.lock().push(4);
        assert_eq!(*lock.lock(), vec![1, 2, 3, 4]);
    }
}

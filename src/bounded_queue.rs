use crate::{
    cancel::{CancelToken, Cancelled},
    error::{ConfigError, Error, Result},
    mutex::PermitLock,
    semaphore::CountingPermit,
};

pub type Item = u64;

/// Fixed-size ring addressed by cursors that only ever grow.
/// Empty iff `write_cursor == read_cursor`.
struct Ring {
    storage: Box<[Item]>,
    write_cursor: u64,
    read_cursor: u64,
}

impl Ring {
    fn with_capacity(capacity: usize) -> Result<Self> {
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|source| Error::Allocation { capacity, source })?;
        storage.resize(capacity, 0);
        Ok(Self {
            storage: storage.into_boxed_slice(),
            write_cursor: 0,
            read_cursor: 0,
        })
    }

    fn slot(&self, cursor: u64) -> usize {
        (cursor % self.storage.len() as u64) as usize
    }

    fn put(&mut self, value: Item) {
        let slot = self.slot(self.write_cursor);
        self.storage[slot] = value;
        self.write_cursor += 1;
    }

    fn take(&mut self) -> Item {
        let value = self.storage[self.slot(self.read_cursor)];
        self.read_cursor += 1;
        value
    }

    fn len(&self) -> usize {
        (self.write_cursor - self.read_cursor) as usize
    }
}

/// Ring buffer shared by producers and consumers.
///
/// Every insert takes a `free_slots` permit and then the lock; every remove
/// takes a `filled_slots` permit and then the lock. The storage is never
/// touched without both. Once no insert or remove is in flight,
/// `free_slots + filled_slots == capacity` and `filled_slots == len()`.
pub struct BoundedBuffer {
    ring: PermitLock<Ring>,
    capacity: usize,
    free_slots: CountingPermit,
    filled_slots: CountingPermit,
}

impl BoundedBuffer {
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the storage cannot be allocated.
    /// Use [`BoundedBuffer::try_new`] to get an error instead.
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(buffer) => buffer,
            Err(err) => panic!("cannot create a buffer of {capacity} slots: {err}"),
        }
    }

    pub fn try_new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity.into());
        }
        Ok(Self {
            ring: PermitLock::new(Ring::with_capacity(capacity)?),
            capacity,
            free_slots: CountingPermit::new(capacity),
            filled_slots: CountingPermit::new(0),
        })
    }

    /// Blocks while the buffer is full.
    pub fn insert(&self, item: Item) {
        self.free_slots.acquire();
        self.ring.lock().put(item);
        self.filled_slots.release();
    }

    /// Blocks while the buffer is empty, then returns the oldest item.
    pub fn remove(&self) -> Item {
        self.filled_slots.acquire();
        self.take_claimed()
    }

    /// Same as [`BoundedBuffer::remove`], except that the wait for an item
    /// ends with [`Cancelled`] once `token` fires and
    /// [`BoundedBuffer::wake_blocked_removers`] has been called. A cancelled
    /// remove never touches the lock or the storage.
    pub fn remove_or_cancel(&self, token: &CancelToken) -> Result<Item, Cancelled> {
        self.filled_slots.acquire_or_cancel(token)?;
        Ok(self.take_claimed())
    }

    // Caller must already hold a `filled_slots` permit.
    fn take_claimed(&self) -> Item {
        let item = self.ring.lock().take();
        self.free_slots.release();
        item
    }

    /// Wakes every thread parked in [`BoundedBuffer::remove_or_cancel`] so it
    /// re-checks its token.
    pub fn wake_blocked_removers(&self) {
        self.filled_slots.wake_all();
    }

    /// Racy snapshot of the free slot permit count.
    pub fn available_slots(&self) -> usize {
        self.free_slots.available()
    }

    /// Racy snapshot of the filled slot permit count.
    pub fn ready_items(&self) -> usize {
        self.filled_slots.available()
    }

    /// Items physically resident, read under the lock.
    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

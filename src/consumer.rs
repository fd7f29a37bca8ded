use std::time::Duration;

use tracing::{debug, trace};

use crate::{
    bounded_queue::{BoundedBuffer, Item},
    cancel::CancelToken,
    latch::{AbandonOnPanic, CompletionLatch},
    trace::{Event, Trace},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
    pub id: usize,
    pub consumed: Vec<Item>,
}

/// Removes items until cancelled. There is no other way out of [`ConsumerTask::run`].
#[derive(Debug, Clone)]
pub struct ConsumerTask {
    id: usize,
    pause: Option<Duration>,
}

impl ConsumerTask {
    pub fn new(id: usize, pause: Option<Duration>) -> Self {
        Self { id, pause }
    }

    /// Cancellation is honoured while blocked on an empty buffer, during the
    /// pacing sleep, and at the top of every iteration. An item that has
    /// been removed is always recorded before the task exits. A panic while
    /// running abandons `latch` so nobody waits on items that will never be
    /// counted.
    pub fn run(
        self,
        buffer: &BoundedBuffer,
        token: &CancelToken,
        latch: &CompletionLatch,
        sink: &dyn Trace,
    ) -> ConsumerReport {
        debug!(consumer = self.id, "consumer started");
        let _abandon = AbandonOnPanic(latch);
        let mut consumed = Vec::new();
        while !token.is_cancelled() {
            let Ok(item) = buffer.remove_or_cancel(token) else {
                break;
            };
            trace!(consumer = self.id, item, "removed");
            sink.record(Event::Consumed {
                consumer: self.id,
                item,
            });
            consumed.push(item);
            latch.record();
            if let Some(pause) = self.pause {
                if token.sleep(pause).is_err() {
                    break;
                }
            }
        }
        debug!(consumer = self.id, count = consumed.len(), "consumer cancelled");
        ConsumerReport {
            id: self.id,
            consumed,
        }
    }
}

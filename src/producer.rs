use std::{ops::Range, thread, time::Duration};

use tracing::{debug, trace};

use crate::{
    bounded_queue::{BoundedBuffer, Item},
    trace::{Event, Trace},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerReport {
    pub id: usize,
    pub produced: Range<Item>,
}

/// Inserts the contiguous range `[id * k, id * k + k)` in increasing order.
#[derive(Debug, Clone)]
pub struct ProducerTask {
    id: usize,
    items: Range<Item>,
    pause: Option<Duration>,
}

impl ProducerTask {
    pub fn new(id: usize, items_per_producer: usize, pause: Option<Duration>) -> Self {
        let count = items_per_producer as Item;
        let start = id as Item * count;
        Self {
            id,
            items: start..start + count,
            pause,
        }
    }

    pub fn items(&self) -> Range<Item> {
        self.items.clone()
    }

    pub fn run(self, buffer: &BoundedBuffer, sink: &dyn Trace) -> ProducerReport {
        debug!(producer = self.id, items = ?self.items, "producer started");
        for item in self.items.clone() {
            buffer.insert(item);
            trace!(producer = self.id, item, "inserted");
            sink.record(Event::Produced {
                producer: self.id,
                item,
            });
            if let Some(pause) = self.pause {
                thread::sleep(pause);
            }
        }
        debug!(producer = self.id, "producer finished");
        ProducerReport {
            id: self.id,
            produced: self.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::trace::Silent;

    #[test]
    fn test_range_derived_from_id() {
        assert_eq!(ProducerTask::new(0, 10, None).items(), 0..10);
        assert_eq!(ProducerTask::new(3, 10, None).items(), 30..40);
        assert_eq!(ProducerTask::new(2, 1, None).items(), 2..3);
    }

    #[test]
    fn test_run_inserts_range_in_order() {
        let buffer = BoundedBuffer::new(8);
        let report = ProducerTask::new(1, 5, None).run(&buffer, &Silent);
        assert_eq!(report, ProducerReport { id: 1, produced: 5..10 });
        let drained: Vec<Item> = (0..5).map(|_| buffer.remove()).collect();
        assert_eq!(drained, vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_trace_line_per_insert() {
        let buffer = BoundedBuffer::new(4);
        let lines = Mutex::new(Vec::new());
        let sink = |event: Event| lines.lock().unwrap().push(event.to_string());
        ProducerTask::new(2, 2, Some(Duration::from_millis(1))).run(&buffer, &sink);
        assert_eq!(
            *lines.lock().unwrap(),
            vec!["producer_2 produced item 4", "producer_2 produced item 5"]
        );
    }
}

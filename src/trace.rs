use std::{
    fmt,
    io::{self, Write},
};

use crate::bounded_queue::Item;

/// One completed buffer operation, as seen by the task that performed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Produced { producer: usize, item: Item },
    Consumed { consumer: usize, item: Item },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Produced { producer, item } => {
                write!(f, "producer_{producer} produced item {item}")
            }
            Event::Consumed { consumer, item } => {
                write!(f, "consumer_{consumer} consumed item {item}")
            }
        }
    }
}

/// Sink for the per-item trace lines. Called from every task thread.
pub trait Trace: Send + Sync {
    fn record(&self, event: Event);
}

impl<F> Trace for F
where
    F: Fn(Event) + Send + Sync,
{
    fn record(&self, event: Event) {
        self(event)
    }
}

/// Writes one line per event to stdout.
pub struct Stdout;

impl Trace for Stdout {
    fn record(&self, event: Event) {
        // A closed pipe must not take a task thread down with it.
        let _ = writeln!(io::stdout().lock(), "{event}");
    }
}

pub struct Silent;

impl Trace for Silent {
    fn record(&self, _event: Event) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_event_lines() {
        let produced = Event::Produced {
            producer: 1,
            item: 14,
        };
        let consumed = Event::Consumed {
            consumer: 3,
            item: 14,
        };
        assert_eq!(produced.to_string(), "producer_1 produced item 14");
        assert_eq!(consumed.to_string(), "consumer_3 consumed item 14");
    }

    #[test]
    fn test_closure_sink() {
        let lines = Mutex::new(Vec::new());
        let sink = |event: Event| lines.lock().unwrap().push(event.to_string());
        sink.record(Event::Produced {
            producer: 0,
            item: 0,
        });
        assert_eq!(*lines.lock().unwrap(), vec!["producer_0 produced item 0"]);
    }
}

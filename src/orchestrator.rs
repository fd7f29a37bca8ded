use std::{
    hint,
    sync::Arc,
    thread::{self, JoinHandle},
};

use tracing::{debug, info, warn};

use crate::{
    bounded_queue::{BoundedBuffer, Item},
    cancel::CancelToken,
    config::{DrainStrategy, TaskConfig},
    consumer::{ConsumerReport, ConsumerTask},
    error::{ConfigError, Error, Result},
    latch::{Abandoned, CompletionLatch},
    producer::{ProducerReport, ProducerTask},
    trace::{Silent, Trace},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub producers: Vec<ProducerReport>,
    pub consumers: Vec<ConsumerReport>,
}

impl RunSummary {
    /// Every consumed item across all consumers, sorted.
    pub fn consumed_items(&self) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .consumers
            .iter()
            .flat_map(|report| report.consumed.iter().copied())
            .collect();
        items.sort_unstable();
        items
    }

    pub fn total_produced(&self) -> u64 {
        self.producers
            .iter()
            .map(|report| report.produced.end - report.produced.start)
            .sum()
    }
}

/// Everything a consumer thread needs, shared through `Arc`s.
#[derive(Clone)]
struct Shared {
    buffer: Arc<BoundedBuffer>,
    token: CancelToken,
    latch: Arc<CompletionLatch>,
    sink: Arc<dyn Trace>,
}

/// Runs one whole producer/consumer session:
/// validate, build the buffer, launch consumers then producers, join the
/// producers, wait for the buffer to drain, then cancel and join consumers.
pub struct Orchestrator {
    config: TaskConfig,
    sink: Arc<dyn Trace>,
}

impl Orchestrator {
    pub fn new(config: TaskConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            sink: Arc::new(Silent),
        })
    }

    pub fn with_trace(mut self, sink: impl Trace + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn run(&self) -> Result<RunSummary> {
        let config = &self.config;
        info!(?config, "initializing buffer");
        let shared = Shared {
            buffer: Arc::new(BoundedBuffer::try_new(config.capacity)?),
            token: CancelToken::new(),
            latch: Arc::new(CompletionLatch::new()),
            sink: Arc::clone(&self.sink),
        };

        info!(
            consumers = config.consumers,
            producers = config.producers,
            "launching tasks"
        );
        let mut consumers = Vec::with_capacity(config.consumers);
        for id in 0..config.consumers {
            match self.spawn_consumer(id, &shared) {
                Ok(handle) => consumers.push(handle),
                Err(err) => {
                    let _ = shutdown(&shared, consumers);
                    return Err(err);
                }
            }
        }

        let mut producers = Vec::with_capacity(config.producers);
        let mut spawn_error = None;
        for id in 0..config.producers {
            match self.spawn_producer(id, &shared) {
                Ok(handle) => producers.push(handle),
                Err(err) => {
                    spawn_error = Some(err);
                    break;
                }
            }
        }

        info!("awaiting producers");
        let produced = join_all(producers);

        let produced = match (spawn_error, produced) {
            (None, Ok(produced)) => produced,
            (Some(err), _) | (None, Err(err)) => {
                warn!(error = %err, "producers did not complete, skipping drain");
                let _ = shutdown(&shared, consumers);
                return Err(err);
            }
        };

        info!(strategy = ?config.drain, "waiting for buffer to drain");
        let drained = match config.drain {
            DrainStrategy::Spin => {
                let capacity = shared.buffer.capacity();
                while shared.buffer.available_slots() != capacity
                    && !shared.latch.is_abandoned()
                {
                    hint::spin_loop();
                }
                if shared.latch.is_abandoned() {
                    Err(Abandoned)
                } else {
                    Ok(())
                }
            }
            DrainStrategy::Completion => shared.latch.wait_for(config.total_items()),
        };

        info!("shutting down consumers");
        let consumed = shutdown(&shared, consumers)?;
        if drained.is_err() {
            // join_all found no panicked consumer, yet the latch was abandoned.
            return Err(Error::TaskPanicked {
                task: "consumer".to_string(),
            });
        }
        info!(
            produced = config.total_items(),
            consumed = shared.latch.completed(),
            "run complete"
        );
        Ok(RunSummary {
            producers: produced,
            consumers: consumed,
        })
    }

    fn spawn_consumer(&self, id: usize, shared: &Shared) -> Result<JoinHandle<ConsumerReport>> {
        let task = ConsumerTask::new(id, self.config.consumer_pause());
        let shared = shared.clone();
        spawn(format!("consumer_{id}"), move || {
            task.run(&shared.buffer, &shared.token, &shared.latch, &*shared.sink)
        })
    }

    fn spawn_producer(&self, id: usize, shared: &Shared) -> Result<JoinHandle<ProducerReport>> {
        let task = ProducerTask::new(
            id,
            self.config.items_per_producer,
            self.config.producer_pause(),
        );
        let buffer = Arc::clone(&shared.buffer);
        let sink = Arc::clone(&shared.sink);
        spawn(format!("producer_{id}"), move || task.run(&buffer, &*sink))
    }
}

fn spawn<T, F>(name: String, f: F) -> Result<JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map_err(|source| Error::Spawn { task: name, source })
}

// Joins every handle even if an earlier one panicked.
fn join_all<T>(handles: Vec<JoinHandle<T>>) -> Result<Vec<T>> {
    let mut reports = Vec::with_capacity(handles.len());
    let mut failure = None;
    for handle in handles {
        let task = handle.thread().name().unwrap_or("task").to_string();
        match handle.join() {
            Ok(report) => reports.push(report),
            Err(_) => {
                failure.get_or_insert(Error::TaskPanicked { task });
            }
        }
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(reports),
    }
}

fn shutdown(
    shared: &Shared,
    consumers: Vec<JoinHandle<ConsumerReport>>,
) -> Result<Vec<ConsumerReport>> {
    debug!(count = consumers.len(), "cancelling consumers");
    shared.token.cancel();
    shared.buffer.wake_blocked_removers();
    join_all(consumers)
}

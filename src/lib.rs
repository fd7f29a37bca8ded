//! Bounded producer/consumer queue built from counting semaphores, plus an
//! orchestrator that runs a fixed set of producers and consumers to
//! completion.

pub mod bounded_queue;
pub mod cancel;
pub mod config;
pub mod consumer;
pub mod error;
pub mod latch;
pub mod mutex;
pub mod orchestrator;
pub mod producer;
pub mod semaphore;
pub mod trace;

pub use bounded_queue::{BoundedBuffer, Item};
pub use cancel::{CancelToken, Cancelled};
pub use config::{
    DelayMode, DrainStrategy, TaskConfig, DEFAULT_DELAY, MAX_CONSUMERS, MAX_PRODUCERS,
};
pub use consumer::{ConsumerReport, ConsumerTask};
pub use error::{ConfigError, Error, Result};
pub use latch::{Abandoned, CompletionLatch};
pub use orchestrator::{Orchestrator, RunSummary};
pub use producer::{ProducerReport, ProducerTask};
pub use trace::{Event, Silent, Stdout, Trace};

use std::{collections::TryReserveError, io};

use thiserror::Error;

/// Rejected configuration. Always raised before any thread starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("not enough arguments: expected {expected} configuration values")]
    MissingArguments { expected: usize },

    #[error("too many producers: {count} (maximum {max})")]
    TooManyProducers { count: usize, max: usize },

    #[error("too many consumers: {count} (maximum {max})")]
    TooManyConsumers { count: usize, max: usize },

    #[error("at least one producer is required")]
    NoProducers,

    #[error("at least one consumer is required")]
    NoConsumers,

    #[error("consumer count {consumers} must be less than the total number of items produced ({total})")]
    TooManyConsumersForItems { consumers: usize, total: u64 },

    #[error("buffer capacity must be at least 1")]
    ZeroCapacity,

    #[error("delay mode must be 0 (consumers pace) or 1 (producers pace), got {0}")]
    InvalidDelayMode(i64),

    #[error("{producers} producers with {items_per_producer} items each overflows the item range")]
    ItemCountOverflow {
        producers: usize,
        items_per_producer: usize,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to allocate a ring buffer of {capacity} slots")]
    Allocation {
        capacity: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("failed to spawn thread {task}")]
    Spawn {
        task: String,
        #[source]
        source: io::Error,
    },

    #[error("{task} panicked")]
    TaskPanicked { task: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

use std::time::Duration;

use clap::ValueEnum;

use crate::{bounded_queue::Item, error::ConfigError};

pub const MAX_PRODUCERS: usize = 16;
pub const MAX_CONSUMERS: usize = 16;

/// Pacing interval used by whichever side the delay mode selects.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Which side sleeps after every buffer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayMode {
    Producers,
    Consumers,
}

impl DelayMode {
    /// `1` paces producers, `0` paces consumers. Anything else is rejected.
    pub fn from_flag(flag: i64) -> Result<Self, ConfigError> {
        match flag {
            1 => Ok(Self::Producers),
            0 => Ok(Self::Consumers),
            other => Err(ConfigError::InvalidDelayMode(other)),
        }
    }
}

/// How the orchestrator decides that every produced item has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DrainStrategy {
    /// Busy-read the free slot count until it equals the capacity.
    Spin,
    /// Block until consumers report every item as processed.
    #[default]
    Completion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    pub producers: usize,
    pub consumers: usize,
    pub items_per_producer: usize,
    pub capacity: usize,
    pub delay_mode: DelayMode,
    pub delay: Duration,
    pub drain: DrainStrategy,
}

impl TaskConfig {
    pub fn new(
        producers: usize,
        consumers: usize,
        items_per_producer: usize,
        capacity: usize,
        delay_mode: DelayMode,
    ) -> Self {
        Self {
            producers,
            consumers,
            items_per_producer,
            capacity,
            delay_mode,
            delay: DEFAULT_DELAY,
            drain: DrainStrategy::default(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_drain(mut self, drain: DrainStrategy) -> Self {
        self.drain = drain;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.producers > MAX_PRODUCERS {
            return Err(ConfigError::TooManyProducers {
                count: self.producers,
                max: MAX_PRODUCERS,
            });
        }
        if self.consumers > MAX_CONSUMERS {
            return Err(ConfigError::TooManyConsumers {
                count: self.consumers,
                max: MAX_CONSUMERS,
            });
        }
        if self.producers == 0 {
            return Err(ConfigError::NoProducers);
        }
        if self.consumers == 0 {
            return Err(ConfigError::NoConsumers);
        }
        let total = self.checked_total_items()?;
        if self.consumers as u64 >= total {
            return Err(ConfigError::TooManyConsumersForItems {
                consumers: self.consumers,
                total,
            });
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    fn checked_total_items(&self) -> Result<Item, ConfigError> {
        (self.producers as Item)
            .checked_mul(self.items_per_producer as Item)
            .ok_or(ConfigError::ItemCountOverflow {
                producers: self.producers,
                items_per_producer: self.items_per_producer,
            })
    }

    /// Number of items produced over the whole run. Only meaningful once
    /// [`TaskConfig::validate`] has passed.
    pub fn total_items(&self) -> Item {
        self.checked_total_items().unwrap_or(Item::MAX)
    }

    pub fn producer_pause(&self) -> Option<Duration> {
        (self.delay_mode == DelayMode::Producers).then_some(self.delay)
    }

    pub fn consumer_pause(&self) -> Option<Duration> {
        (self.delay_mode == DelayMode::Consumers).then_some(self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(producers: usize, consumers: usize, items: usize) -> TaskConfig {
        TaskConfig::new(producers, consumers, items, 8, DelayMode::Consumers)
    }

    #[test]
    fn test_producer_limit_boundary() {
        assert_eq!(config(16, 4, 10).validate(), Ok(()));
        assert_eq!(
            config(17, 4, 10).validate(),
            Err(ConfigError::TooManyProducers { count: 17, max: 16 })
        );
    }

    #[test]
    fn test_consumer_limit_boundary() {
        assert_eq!(config(2, 16, 10).validate(), Ok(()));
        assert_eq!(
            config(2, 17, 10).validate(),
            Err(ConfigError::TooManyConsumers { count: 17, max: 16 })
        );
    }

    #[test]
    fn test_consumers_must_be_fewer_than_items() {
        assert_eq!(
            config(2, 10, 5).validate(),
            Err(ConfigError::TooManyConsumersForItems {
                consumers: 10,
                total: 10
            })
        );
        assert_eq!(config(2, 9, 5).validate(), Ok(()));
    }

    #[test]
    fn test_zero_values_rejected() {
        assert_eq!(config(0, 1, 5).validate(), Err(ConfigError::NoProducers));
        assert_eq!(config(1, 0, 5).validate(), Err(ConfigError::NoConsumers));
        assert_eq!(
            config(1, 1, 0).validate(),
            Err(ConfigError::TooManyConsumersForItems {
                consumers: 1,
                total: 0
            })
        );
        let mut zero_capacity = config(1, 1, 5);
        zero_capacity.capacity = 0;
        assert_eq!(zero_capacity.validate(), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn test_total_items_overflow_rejected() {
        assert_eq!(
            config(16, 1, usize::MAX).validate(),
            Err(ConfigError::ItemCountOverflow {
                producers: 16,
                items_per_producer: usize::MAX
            })
        );
    }

    #[test]
    fn test_delay_mode_flag() {
        assert_eq!(DelayMode::from_flag(1), Ok(DelayMode::Producers));
        assert_eq!(DelayMode::from_flag(0), Ok(DelayMode::Consumers));
        assert_eq!(DelayMode::from_flag(2), Err(ConfigError::InvalidDelayMode(2)));

        let paced_producers = TaskConfig::new(1, 1, 2, 1, DelayMode::Producers);
        assert_eq!(paced_producers.producer_pause(), Some(DEFAULT_DELAY));
        assert_eq!(paced_producers.consumer_pause(), None);
    }
}

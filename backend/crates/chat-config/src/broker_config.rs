use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

// Inbound queue capacity, shared by every producer
pub const MIN_INBOUND_CAPACITY: usize = 1;
pub const MAX_INBOUND_CAPACITY: usize = 100_000;
pub const DEFAULT_INBOUND_CAPACITY: usize = 100;

// Per-recipient delivery channel capacity
pub const MIN_DELIVERY_CAPACITY: usize = 1;
pub const MAX_DELIVERY_CAPACITY: usize = 10_000;
pub const DEFAULT_DELIVERY_CAPACITY: usize = 16;

/// Message broker settings.
/// Both queues are bounded; the values only trade memory for slack.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Capacity of the inbound queue. Producers wait when it is full.
    pub inbound_capacity: usize,
    /// Capacity of delivery channels created through `subscribe`.
    /// A full delivery channel drops messages for that recipient.
    pub delivery_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            inbound_capacity: DEFAULT_INBOUND_CAPACITY,
            delivery_capacity: DEFAULT_DELIVERY_CAPACITY,
        }
    }
}

impl BrokerConfig {
    /// Validate both capacities are within operational ranges.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.inbound_capacity < MIN_INBOUND_CAPACITY
            || self.inbound_capacity > MAX_INBOUND_CAPACITY
        {
            return Err(ConfigError::broker(format!(
                "broker.inbound_capacity must be {}-{}, got {}",
                MIN_INBOUND_CAPACITY, MAX_INBOUND_CAPACITY, self.inbound_capacity
            )));
        }

        if self.delivery_capacity < MIN_DELIVERY_CAPACITY
            || self.delivery_capacity > MAX_DELIVERY_CAPACITY
        {
            return Err(ConfigError::broker(format!(
                "broker.delivery_capacity must be {}-{}, got {}",
                MIN_DELIVERY_CAPACITY, MAX_DELIVERY_CAPACITY, self.delivery_capacity
            )));
        }

        Ok(())
    }
}

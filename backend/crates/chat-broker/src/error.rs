use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Broker is closed, message not accepted {location}")]
    BrokerClosed { location: ErrorLocation },

    #[error("Inbound queue full (capacity: {capacity}) {location}")]
    QueueFull {
        capacity: usize,
        location: ErrorLocation,
    },

    #[error("Broker event loop already started {location}")]
    AlreadyRunning { location: ErrorLocation },
}

impl BrokerError {
    #[track_caller]
    pub fn closed() -> Self {
        Self::BrokerClosed {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn queue_full(capacity: usize) -> Self {
        Self::QueueFull {
            capacity,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn already_running() -> Self {
        Self::AlreadyRunning {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Terminal for the session: the broker will never accept again.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::BrokerClosed { .. })
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BrokerClosed { .. } => "BROKER_CLOSED",
            Self::QueueFull { .. } => "QUEUE_FULL",
            Self::AlreadyRunning { .. } => "ALREADY_RUNNING",
        }
    }
}

pub type Result<T> = std::result::Result<T, BrokerError>;

use serde::{Deserialize, Serialize};

/// Timestamp value meaning "not stamped yet"; `submit` replaces it.
pub const UNSET_TIMESTAMP: i64 = 0;

/// A chat message routed by the broker.
///
/// `recipient` is ignored when `broadcast` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    #[serde(default)]
    pub recipient: String,
    pub content: String,
    #[serde(default)]
    pub broadcast: bool,
    /// Epoch seconds
    #[serde(default)]
    pub timestamp: i64,
}

/// How the dispatcher routes a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Unicast,
    Broadcast,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unicast => "unicast",
            Self::Broadcast => "broadcast",
        }
    }
}

impl Message {
    pub fn unicast(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            content: content.into(),
            broadcast: false,
            timestamp: UNSET_TIMESTAMP,
        }
    }

    pub fn broadcast(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            recipient: String::new(),
            content: content.into(),
            broadcast: true,
            timestamp: UNSET_TIMESTAMP,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_timestamp_unset(&self) -> bool {
        self.timestamp == UNSET_TIMESTAMP
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        if self.broadcast {
            DeliveryMode::Broadcast
        } else {
            DeliveryMode::Unicast
        }
    }

    /// Fill the timestamp once; a caller-provided value is never overwritten.
    pub(crate) fn stamp_if_unset(&mut self, now: i64) {
        if self.is_timestamp_unset() {
            self.timestamp = now;
        }
    }
}

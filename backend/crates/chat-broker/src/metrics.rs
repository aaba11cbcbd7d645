use crate::{DeliveryMode, DropReason};

use metrics::{counter, gauge, histogram};

/// Metrics collector for broker operations
#[derive(Clone)]
pub struct Metrics {
    prefix: &'static str,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            prefix: "chat_broker",
        }
    }

    /// Record message accepted by the submission API
    pub fn message_submitted(&self, mode: DeliveryMode) {
        counter!(format!("{}.messages.submitted", self.prefix)).increment(1);
        counter!(format!(
            "{}.messages.submitted.{}",
            self.prefix,
            mode.as_str()
        ))
        .increment(1);
    }

    /// Record message rejected because the broker is closed
    pub fn message_rejected(&self) {
        counter!(format!("{}.messages.rejected", self.prefix)).increment(1);
    }

    /// Record successful send to one recipient
    pub fn message_delivered(&self, mode: DeliveryMode) {
        counter!(format!("{}.messages.delivered", self.prefix)).increment(1);
        counter!(format!(
            "{}.messages.delivered.{}",
            self.prefix,
            mode.as_str()
        ))
        .increment(1);
    }

    /// Record message dropped for one recipient
    pub fn message_dropped(&self, reason: DropReason) {
        counter!(format!("{}.messages.dropped", self.prefix)).increment(1);
        counter!(format!("{}.messages.dropped.{}", self.prefix, reason)).increment(1);
    }

    /// Record messages left in the inbound queue at shutdown
    pub fn messages_discarded(&self, count: u64) {
        counter!(format!("{}.messages.discarded", self.prefix)).increment(count);
    }

    /// Record registry size after a change
    pub fn subscribers(&self, count: usize) {
        gauge!(format!("{}.subscribers.active", self.prefix)).set(count as f64);
    }

    /// Record subscription change
    pub fn subscription_changed(&self, action: &str) {
        counter!(format!("{}.subscriptions.{}", self.prefix, action)).increment(1);
    }

    /// Record time spent routing one message
    pub fn dispatch_latency(&self, duration: std::time::Duration) {
        histogram!(format!("{}.dispatch.latency_us", self.prefix))
            .record(duration.as_micros() as f64);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

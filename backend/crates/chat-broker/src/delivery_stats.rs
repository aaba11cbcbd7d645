use crate::DropReason;

use std::sync::atomic::{AtomicU64, Ordering};

/// In-process delivery counters, readable without a metrics recorder.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    submitted: AtomicU64,
    dispatched: AtomicU64,
    delivered: AtomicU64,
    dropped_full: AtomicU64,
    dropped_closed: AtomicU64,
    dropped_no_recipient: AtomicU64,
    discarded_on_shutdown: AtomicU64,
}

/// Point-in-time copy of [`DeliveryStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryStatsSnapshot {
    /// Messages accepted onto the inbound queue
    pub submitted: u64,
    /// Messages taken off the inbound queue and routed
    pub dispatched: u64,
    /// Per-recipient successful sends
    pub delivered: u64,
    pub dropped_full: u64,
    pub dropped_closed: u64,
    pub dropped_no_recipient: u64,
    /// Messages still queued when the event loop stopped
    pub discarded_on_shutdown: u64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self, reason: DropReason) {
        let counter = match reason {
            DropReason::Full => &self.dropped_full,
            DropReason::Closed => &self.dropped_closed,
            DropReason::NoRecipient => &self.dropped_no_recipient,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, count: u64) {
        self.discarded_on_shutdown.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliveryStatsSnapshot {
        DeliveryStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Acquire),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped_full: self.dropped_full.load(Ordering::Relaxed),
            dropped_closed: self.dropped_closed.load(Ordering::Relaxed),
            dropped_no_recipient: self.dropped_no_recipient.load(Ordering::Relaxed),
            discarded_on_shutdown: self.discarded_on_shutdown.load(Ordering::Relaxed),
        }
    }
}

impl DeliveryStatsSnapshot {
    /// All per-recipient drops, whatever the reason
    pub fn dropped(&self) -> u64 {
        self.dropped_full + self.dropped_closed + self.dropped_no_recipient
    }
}

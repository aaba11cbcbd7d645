use crate::{
    BrokerError, BrokerState, DeliveryMode, DeliveryStats, DeliveryStatsSnapshot, DropReason,
    Message, Metrics, MetricsTimer, Result as BrokerResult, ShutdownCoordinator, ShutdownGuard,
    SubscriberRegistry, create_event_loop_span,
};

use chat_config::{
    BrokerConfig, MAX_DELIVERY_CAPACITY, MAX_INBOUND_CAPACITY, MIN_DELIVERY_CAPACITY,
    MIN_INBOUND_CAPACITY,
};

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Routes chat messages from many producers to registered recipients.
///
/// Producers call [`Broker::submit`]; a single event loop started with
/// [`Broker::run`] drains the bounded inbound queue and fans each message
/// out with non-blocking sends. A recipient whose channel is full misses
/// the message; nothing ever waits on a slow consumer.
///
/// Cloning is cheap and every clone drives the same broker.
pub struct Broker {
    inner: Arc<BrokerInner>,
}

struct BrokerInner {
    inbound_tx: mpsc::Sender<Message>,
    /// Taken by the first `run`
    inbound_rx: Mutex<Option<mpsc::Receiver<Message>>>,
    inbound_capacity: usize,
    delivery_capacity: usize,
    registry: SubscriberRegistry,
    shutdown: ShutdownCoordinator,
    state_tx: watch::Sender<BrokerState>,
    stats: DeliveryStats,
    metrics: Metrics,
}

impl Broker {
    pub fn new(config: &BrokerConfig, shutdown: ShutdownCoordinator) -> Self {
        let inbound_capacity = config
            .inbound_capacity
            .clamp(MIN_INBOUND_CAPACITY, MAX_INBOUND_CAPACITY);
        let delivery_capacity = config
            .delivery_capacity
            .clamp(MIN_DELIVERY_CAPACITY, MAX_DELIVERY_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(inbound_capacity);
        let (state_tx, _) = watch::channel(BrokerState::Idle);

        Self {
            inner: Arc::new(BrokerInner {
                inbound_tx,
                inbound_rx: Mutex::new(Some(inbound_rx)),
                inbound_capacity,
                delivery_capacity,
                registry: SubscriberRegistry::new(),
                shutdown,
                state_tx,
                stats: DeliveryStats::new(),
                metrics: Metrics::new(),
            }),
        }
    }

    // ---------------------------------------------------------------------
    // Submission
    // ---------------------------------------------------------------------

    /// Enqueue a message for dispatch.
    ///
    /// Stamps the current epoch time if the timestamp is unset. Waits only
    /// while the inbound queue is full. Fails with `BrokerClosed` if the
    /// shutdown signal has fired, including while waiting for capacity.
    pub async fn submit(&self, mut message: Message) -> BrokerResult<()> {
        if self.inner.shutdown.is_shutdown() {
            self.inner.metrics.message_rejected();
            return Err(BrokerError::closed());
        }

        message.stamp_if_unset(chrono::Utc::now().timestamp());
        let mode = message.delivery_mode();

        let mut guard = self.inner.shutdown.subscribe_guard();
        let sent = tokio::select! {
            biased;
            _ = guard.wait() => false,
            result = self.inner.inbound_tx.send(message) => result.is_ok(),
        };

        if !sent {
            self.inner.metrics.message_rejected();
            return Err(BrokerError::closed());
        }

        self.record_submitted(mode);
        Ok(())
    }

    /// Enqueue without waiting. Fails with `QueueFull` instead of applying
    /// backpressure; nothing is enqueued in that case.
    pub fn try_submit(&self, mut message: Message) -> BrokerResult<()> {
        if self.inner.shutdown.is_shutdown() {
            self.inner.metrics.message_rejected();
            return Err(BrokerError::closed());
        }

        message.stamp_if_unset(chrono::Utc::now().timestamp());
        let mode = message.delivery_mode();

        match self.inner.inbound_tx.try_send(message) {
            Ok(()) => {
                self.record_submitted(mode);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                Err(BrokerError::queue_full(self.inner.inbound_capacity))
            }
            Err(TrySendError::Closed(_)) => {
                self.inner.metrics.message_rejected();
                Err(BrokerError::closed())
            }
        }
    }

    // ---------------------------------------------------------------------
    // Registry
    // ---------------------------------------------------------------------

    /// See [`SubscriberRegistry::register`]
    pub async fn register(
        &self,
        id: impl Into<String>,
        sender: mpsc::Sender<Message>,
    ) -> Option<mpsc::Sender<Message>> {
        self.inner.registry.register(id, sender).await
    }

    /// Register `id` with a new channel of the configured delivery capacity.
    /// See [`SubscriberRegistry::subscribe`].
    pub async fn subscribe(
        &self,
        id: impl Into<String>,
    ) -> (mpsc::Receiver<Message>, Option<mpsc::Sender<Message>>) {
        self.inner
            .registry
            .subscribe(id, self.inner.delivery_capacity)
            .await
    }

    /// See [`SubscriberRegistry::unregister`]
    pub async fn unregister(&self, id: &str) -> bool {
        self.inner.registry.unregister(id).await
    }

    pub async fn lookup(&self, id: &str) -> Option<mpsc::WeakSender<Message>> {
        self.inner.registry.lookup(id).await
    }

    pub async fn snapshot(&self) -> Vec<(String, mpsc::WeakSender<Message>)> {
        self.inner.registry.snapshot().await
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.inner.registry
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Run the event loop until the shutdown signal fires.
    ///
    /// Only one loop may ever run per broker; later calls fail with
    /// `AlreadyRunning`. Messages still queued at shutdown are discarded.
    pub async fn run(&self) -> BrokerResult<()> {
        let inbound_rx = self
            .inner
            .inbound_rx
            .lock()
            .await
            .take()
            .ok_or_else(BrokerError::already_running)?;

        let guard = self.inner.shutdown.subscribe_guard();
        let span =
            create_event_loop_span(self.inner.inbound_capacity, self.inner.delivery_capacity);

        self.event_loop(inbound_rx, guard).instrument(span).await;
        Ok(())
    }

    /// Run the event loop on the tokio runtime
    pub fn spawn(&self) -> JoinHandle<BrokerResult<()>> {
        let broker = self.clone();
        tokio::spawn(async move { broker.run().await })
    }

    /// Fire the shared shutdown signal. Returns true if this call fired it.
    pub fn shutdown(&self) -> bool {
        self.inner.shutdown.shutdown()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.shutdown.is_shutdown()
    }

    pub fn state(&self) -> BrokerState {
        *self.inner.state_tx.borrow()
    }

    /// Wait until the event loop has stopped.
    /// Never resolves for a broker whose loop was never started.
    pub async fn stopped(&self) {
        let mut state_rx = self.inner.state_tx.subscribe();
        let _ = state_rx
            .wait_for(|state| *state == BrokerState::Stopped)
            .await;
    }

    pub fn stats(&self) -> DeliveryStatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn inbound_capacity(&self) -> usize {
        self.inner.inbound_capacity
    }

    pub fn delivery_capacity(&self) -> usize {
        self.inner.delivery_capacity
    }

    async fn event_loop(
        &self,
        mut inbound_rx: mpsc::Receiver<Message>,
        mut guard: ShutdownGuard,
    ) {
        self.inner.state_tx.send_replace(BrokerState::Running);
        // Publishes Stopped on every exit, including when the future is dropped
        let _stopped = StoppedOnDrop(&self.inner.state_tx);
        info!(
            "Broker event loop started (inbound capacity {})",
            self.inner.inbound_capacity
        );

        loop {
            tokio::select! {
                biased;
                _ = guard.wait() => break,
                received = inbound_rx.recv() => match received {
                    Some(message) => self.dispatch(message).await,
                    // The broker holds a sender for its whole life
                    None => break,
                },
            }
        }

        // Producers blocked on a full queue see the close and fail
        inbound_rx.close();
        let mut discarded = 0u64;
        while inbound_rx.try_recv().is_ok() {
            discarded += 1;
        }

        if discarded > 0 {
            warn!("Broker stopping, discarded {discarded} undelivered messages");
            self.inner.stats.record_discarded(discarded);
            self.inner.metrics.messages_discarded(discarded);
        }

        let stats = self.inner.stats.snapshot();
        info!(
            "Broker event loop stopped (dispatched {}, delivered {}, dropped {})",
            stats.dispatched,
            stats.delivered,
            stats.dropped()
        );
    }

    /// Route one message. The registry read lock is held for the whole fan
    /// out, so an unregistered recipient never receives afterwards.
    async fn dispatch(&self, message: Message) {
        let timer = MetricsTimer::new(self.inner.metrics.clone());
        let mode = message.delivery_mode();
        let subscribers = self.inner.registry.read().await;

        match mode {
            DeliveryMode::Broadcast => {
                debug!(
                    "Broadcast from {} to {} subscribers",
                    message.sender,
                    subscribers.len()
                );
                for (id, sender) in subscribers.iter() {
                    self.deliver(id, sender, message.clone(), mode);
                }
            }
            DeliveryMode::Unicast => match subscribers.get(&message.recipient) {
                Some((id, sender)) => self.deliver(id, sender, message, mode),
                None => self.record_dropped(&message.recipient, DropReason::NoRecipient),
            },
        }

        drop(subscribers);
        self.inner.stats.record_dispatched();
        timer.finish();
    }

    fn deliver(
        &self,
        id: &str,
        sender: &mpsc::Sender<Message>,
        message: Message,
        mode: DeliveryMode,
    ) {
        match sender.try_send(message) {
            Ok(()) => {
                self.inner.stats.record_delivered();
                self.inner.metrics.message_delivered(mode);
            }
            Err(TrySendError::Full(_)) => self.record_dropped(id, DropReason::Full),
            Err(TrySendError::Closed(_)) => self.record_dropped(id, DropReason::Closed),
        }
    }

    fn record_submitted(&self, mode: DeliveryMode) {
        self.inner.stats.record_submitted();
        self.inner.metrics.message_submitted(mode);
    }

    fn record_dropped(&self, recipient: &str, reason: DropReason) {
        debug!("Dropped message for {recipient} ({reason})");
        self.inner.stats.record_dropped(reason);
        self.inner.metrics.message_dropped(reason);
    }
}

struct StoppedOnDrop<'a>(&'a watch::Sender<BrokerState>);

impl Drop for StoppedOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_replace(BrokerState::Stopped);
    }
}

impl Clone for Broker {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

use crate::{Message, Metrics};

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use tokio::sync::{RwLock, RwLockReadGuard, mpsc};

/// Maps recipient identifiers to their delivery channels.
///
/// One lock guards the whole map: lookups and broadcast snapshots share it,
/// register/unregister take it exclusively.
pub struct SubscriberRegistry {
    inner: Arc<RwLock<RegistryInner>>,
    metrics: Metrics,
}

pub(crate) struct RegistryInner {
    /// Delivery channel by recipient id
    subscribers: HashMap<String, mpsc::Sender<Message>>,
}

impl RegistryInner {
    pub(crate) fn get(&self, id: &str) -> Option<(&str, &mpsc::Sender<Message>)> {
        self.subscribers
            .get_key_value(id)
            .map(|(id, sender)| (id.as_str(), sender))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &mpsc::Sender<Message>)> {
        self.subscribers
            .iter()
            .map(|(id, sender)| (id.as_str(), sender))
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                subscribers: HashMap::new(),
            })),
            metrics: Metrics::new(),
        }
    }

    /// Install or replace the delivery channel for `id`.
    ///
    /// The registry takes ownership of `sender`. Hand over the last strong
    /// sender of the channel: `unregister` can only end the stream if no
    /// clone is kept elsewhere.
    ///
    /// Returns the channel that was replaced, if any. The registry does not
    /// close it; the recipient decides what to do with it.
    pub async fn register(
        &self,
        id: impl Into<String>,
        sender: mpsc::Sender<Message>,
    ) -> Option<mpsc::Sender<Message>> {
        let id = id.into();
        let mut inner = self.inner.write().await;

        let previous = inner.subscribers.insert(id.clone(), sender);
        let total = inner.subscribers.len();
        drop(inner);

        if previous.is_some() {
            debug!("Replaced delivery channel for {id} ({total} total)");
            self.metrics.subscription_changed("replaced");
        } else {
            info!("Registered subscriber {id} ({total} total)");
            self.metrics.subscription_changed("registered");
        }
        self.metrics.subscribers(total);

        previous
    }

    /// Create a bounded delivery channel and register its sender.
    ///
    /// The registry holds the only sender, so `unregister` ends the stream
    /// seen by the returned receiver. A channel this replaces is handed back
    /// as with `register`; dropping it ends the previous receiver's stream.
    pub async fn subscribe(
        &self,
        id: impl Into<String>,
        capacity: usize,
    ) -> (mpsc::Receiver<Message>, Option<mpsc::Sender<Message>>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let previous = self.register(id, sender).await;
        (receiver, previous)
    }

    /// Remove the channel for `id` and drop the registry's sender.
    ///
    /// The registry holds the only strong sender, so the receiver observes
    /// end-of-stream. Returns false if `id` was not registered.
    pub async fn unregister(&self, id: &str) -> bool {
        let mut inner = self.inner.write().await;

        let removed = inner.subscribers.remove(id);
        let total = inner.subscribers.len();
        drop(inner);

        match removed {
            Some(sender) => {
                drop(sender);
                info!("Unregistered subscriber {id} ({total} total remaining)");
                self.metrics.subscription_changed("unregistered");
                self.metrics.subscribers(total);
                true
            }
            None => false,
        }
    }

    /// Delivery channel currently registered for `id`.
    ///
    /// The handle is weak so it never outlives an `unregister`; upgrade it
    /// to send.
    pub async fn lookup(&self, id: &str) -> Option<mpsc::WeakSender<Message>> {
        let inner = self.inner.read().await;
        inner.subscribers.get(id).map(mpsc::Sender::downgrade)
    }

    /// Consistent point-in-time copy of every registration, as weak handles
    pub async fn snapshot(&self) -> Vec<(String, mpsc::WeakSender<Message>)> {
        let inner = self.inner.read().await;
        inner
            .subscribers
            .iter()
            .map(|(id, sender)| (id.clone(), sender.downgrade()))
            .collect()
    }

    /// Registered identifiers, sorted
    pub async fn ids(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut ids: Vec<String> = inner.subscribers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn contains(&self, id: &str) -> bool {
        let inner = self.inner.read().await;
        inner.subscribers.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Shared read access for the dispatcher. Writers wait until it is dropped.
    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().await
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SubscriberRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            metrics: self.metrics.clone(),
        }
    }
}

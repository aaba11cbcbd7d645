#![allow(dead_code)]

use chat_broker::{Broker, Message, ShutdownCoordinator};
use chat_config::BrokerConfig;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, timeout};

pub const WAIT: Duration = Duration::from_secs(2);

/// Broker with its own shutdown signal, event loop not started
pub fn create_broker(inbound_capacity: usize, delivery_capacity: usize) -> Broker {
    let config = BrokerConfig {
        inbound_capacity,
        delivery_capacity,
    };
    Broker::new(&config, ShutdownCoordinator::new())
}

pub struct RunningBroker {
    pub broker: Broker,
    pub handle: JoinHandle<chat_broker::Result<()>>,
}

/// Broker with its event loop spawned
pub fn start_broker(inbound_capacity: usize, delivery_capacity: usize) -> RunningBroker {
    let broker = create_broker(inbound_capacity, delivery_capacity);
    let handle = broker.spawn();
    RunningBroker { broker, handle }
}

/// Wait until the event loop has routed at least `count` messages
pub async fn wait_for_dispatched(broker: &Broker, count: u64) {
    let deadline = Instant::now() + WAIT;
    while broker.stats().dispatched < count {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for {count} dispatched messages, stats: {:?}",
            broker.stats()
        );
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

pub async fn recv_within(rx: &mut mpsc::Receiver<Message>) -> Message {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("channel closed")
}

/// Channel is open and holds nothing
pub fn assert_empty(rx: &mut mpsc::Receiver<Message>) {
    assert!(
        matches!(rx.try_recv(), Err(mpsc::error::TryRecvError::Empty)),
        "expected no pending message"
    );
}

mod common;

use common::{WAIT, start_broker, wait_for_dispatched};

use chat_broker::{Message, SubscriberRegistry};

use std::collections::HashSet;

use tokio::sync::mpsc;
use tokio::time::timeout;

const WORKERS: usize = 8;
const ROUNDS: usize = 200;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_concurrent_register_unregister_when_done_then_registry_matches_serial_result() {
    // Given
    let registry = SubscriberRegistry::new();

    // When - each worker churns its own ids; readers hammer lookups and snapshots
    let mut tasks = Vec::new();
    for worker in 0..WORKERS {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            let mut receivers = Vec::new();
            for round in 0..ROUNDS {
                let id = format!("w{worker}-{}", round % 10);
                let (tx, rx) = mpsc::channel(1);
                receivers.push(rx);
                registry.register(id.clone(), tx).await;
                if round % 3 == 0 {
                    registry.unregister(&id).await;
                }
            }
            receivers
        }));
    }
    for _ in 0..WORKERS {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..ROUNDS {
                let snapshot = registry.snapshot().await;
                let unique: HashSet<_> = snapshot.iter().map(|(id, _)| id.clone()).collect();
                assert_eq!(unique.len(), snapshot.len(), "duplicate keys in snapshot");
                let _ = registry.lookup("w0-0").await;
            }
            Vec::new()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // Then - replay the same per-worker sequence serially
    let mut expected = HashSet::new();
    for worker in 0..WORKERS {
        for round in 0..ROUNDS {
            let id = format!("w{worker}-{}", round % 10);
            expected.insert(id.clone());
            if round % 3 == 0 {
                expected.remove(&id);
            }
        }
    }
    let actual: HashSet<String> = registry.ids().await.into_iter().collect();
    assert_eq!(actual, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_many_producers_when_unicasting_then_each_message_delivered_at_most_once() {
    // Given
    const PRODUCERS: usize = 10;
    const PER_PRODUCER: usize = 100;
    let running = start_broker(16, PRODUCERS * PER_PRODUCER);
    let broker = running.broker.clone();
    let mut receivers = Vec::new();
    for i in 0..PRODUCERS {
        receivers.push(broker.subscribe(format!("user-{i}")).await.0);
    }

    // When
    let mut producers = Vec::new();
    for p in 0..PRODUCERS {
        let broker = broker.clone();
        producers.push(tokio::spawn(async move {
            for n in 0..PER_PRODUCER {
                let recipient = format!("user-{}", (p + n) % PRODUCERS);
                broker
                    .submit(Message::unicast(format!("p{p}"), recipient, format!("{p}:{n}")))
                    .await
                    .unwrap();
            }
        }));
    }
    for producer in producers {
        timeout(WAIT, producer).await.unwrap().unwrap();
    }
    wait_for_dispatched(&broker, (PRODUCERS * PER_PRODUCER) as u64).await;

    // Then
    let mut seen = HashSet::new();
    for (i, rx) in receivers.iter_mut().enumerate() {
        while let Ok(message) = rx.try_recv() {
            assert_eq!(message.recipient, format!("user-{i}"));
            assert!(seen.insert(message.content), "duplicate delivery");
        }
    }
    assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
    assert_eq!(broker.stats().dropped(), 0);

    broker.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_churning_subscribers_during_broadcast_then_no_duplicates_per_recipient() {
    // Given
    let running = start_broker(32, 1024);
    let broker = running.broker.clone();
    let (mut stable_rx, _) = broker.subscribe("stable").await;

    // When
    let churn = {
        let broker = broker.clone();
        tokio::spawn(async move {
            for i in 0..200 {
                let (_rx, _) = broker.subscribe(format!("transient-{}", i % 5)).await;
                broker.unregister(&format!("transient-{}", i % 5)).await;
            }
        })
    };
    for n in 0..300 {
        broker
            .submit(Message::broadcast("carol", n.to_string()))
            .await
            .unwrap();
    }
    churn.await.unwrap();
    wait_for_dispatched(&broker, 300).await;

    // Then
    let mut seen = HashSet::new();
    while let Ok(message) = stable_rx.try_recv() {
        assert!(seen.insert(message.content));
    }
    assert_eq!(seen.len(), 300);

    broker.shutdown();
}

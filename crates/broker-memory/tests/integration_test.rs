use std::time::Duration;

use airsync_bootable::Bootable;
use airsync_broker::{BrokerTransport, Codec, Envelope, JsonCodec};
use airsync_broker_memory::{MemoryReplicationBridge, MemoryTransport};
use airsync_events::{Notification, SESSION_TOPIC, SessionEvent};
use airsync_pubsub::{Publisher, Subscriber};
use futures::StreamExt;
use tokio::time::{sleep, timeout};

struct Instance {
    publisher: Publisher<Notification>,
    bridge: MemoryReplicationBridge,
    observer: Subscriber<Notification>,
}

impl Instance {
    async fn start(hub: &MemoryTransport) -> Self {
        let publisher = Publisher::default();
        let observer = publisher.topic(SESSION_TOPIC).subscribe_with_capacity(16);
        let bridge = MemoryReplicationBridge::new(publisher.clone(), hub.clone(), JsonCodec);
        bridge.start().await.unwrap();

        Self {
            publisher,
            bridge,
            observer,
        }
    }

    async fn received_ids(&mut self) -> Vec<String> {
        let mut ids = Vec::new();
        while let Ok(Some(Notification::Event(event))) =
            timeout(Duration::from_millis(200), self.observer.recv()).await
        {
            ids.push(event.event.id);
        }
        ids
    }
}

#[tokio::test]
async fn test_event_reaches_other_instance_once() {
    let hub = MemoryTransport::default();
    let mut a = Instance::start(&hub).await;
    let mut b = Instance::start(&hub).await;

    let event = SessionEvent::session_deleted("a");
    a.publisher
        .topic(SESSION_TOPIC)
        .publish(Notification::Event(event.clone()));

    assert_eq!(b.received_ids().await, vec![event.event.id.clone()]);
    // A only sees its own local publish, never the echo from the hub.
    assert_eq!(a.received_ids().await, vec![event.event.id]);

    a.bridge.shutdown().await.unwrap();
    b.bridge.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_redelivered_event_is_applied_once_per_instance() {
    let hub = MemoryTransport::default();
    let mut a = Instance::start(&hub).await;
    let mut b = Instance::start(&hub).await;

    let first = SessionEvent::session_deleted("a");
    let second = SessionEvent::session_deleted("b");
    let wire = |event: &SessionEvent| {
        JsonCodec
            .encode(&Envelope::wrap(event, "third-instance"))
            .unwrap()
    };

    hub.publish(wire(&first)).await.unwrap();
    hub.publish(wire(&first)).await.unwrap();
    hub.publish(wire(&second)).await.unwrap();

    let expected = vec![first.event.id, second.event.id];
    assert_eq!(a.received_ids().await, expected);
    assert_eq!(b.received_ids().await, expected);

    a.bridge.shutdown().await.unwrap();
    b.bridge.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_replicated_event_is_not_sent_back() {
    let hub = MemoryTransport::default();
    let a = Instance::start(&hub).await;
    let b = Instance::start(&hub).await;
    let mut wire = hub.subscribe().await.unwrap();

    a.publisher
        .topic(SESSION_TOPIC)
        .publish(Notification::Event(SessionEvent::session_deleted("a")));
    sleep(Duration::from_millis(100)).await;

    let mut senders = Vec::new();
    while let Ok(Some(Ok(bytes))) = timeout(Duration::from_millis(100), wire.next()).await {
        senders.push(JsonCodec.decode(&bytes).unwrap().client_id);
    }

    assert_eq!(senders, vec![a.bridge.client_id().to_string()]);

    a.bridge.shutdown().await.unwrap();
    b.bridge.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_detaches_from_hub() {
    let hub = MemoryTransport::default();
    let a = Instance::start(&hub).await;
    assert_eq!(hub.listener_count(), 1);

    a.bridge.shutdown().await.unwrap();

    assert_eq!(hub.listener_count(), 0);
    assert_eq!(a.publisher.topic(SESSION_TOPIC).subscriber_count(), 1);
}

use std::time::Duration;

use airsync_bootable::{Bootable, BootableError};
use airsync_broker::JsonCodec;
use airsync_broker_memory::{MemoryReplicationBridge, MemoryTransport};
use airsync_events::{
    EventKind, EventPayload, Message, NewMessage, Notification, SESSION_TOPIC, Session,
    SessionEvent, session_topic,
};
use airsync_pubsub::{Publisher, Subscriber};
use airsync_router::{DEFAULT_GRACE_PERIOD, Error, RouterOptions, SessionEventRouter};
use assert_matches::assert_matches;
use async_trait::async_trait;
use tokio::time::{sleep, timeout};

async fn next(subscriber: &mut Subscriber<Notification>) -> Option<Notification> {
    timeout(Duration::from_secs(1), subscriber.recv())
        .await
        .expect("timed out waiting for notification")
}

async fn started_router() -> SessionEventRouter {
    let router = SessionEventRouter::new(Publisher::default(), RouterOptions::default());
    router.start().await.unwrap();
    router
}

#[tokio::test]
async fn test_session_created_reaches_session_topic() {
    let router = started_router().await;
    let session = Session::new();
    let mut subscriber = router
        .publisher()
        .topic(session_topic(&session.id))
        .subscribe();

    router.publish(SessionEvent::session_created(session.clone()));

    assert_matches!(next(&mut subscriber).await, Some(Notification::Event(event)) => {
        assert_eq!(event.kind(), EventKind::SessionCreated);
        assert_eq!(event.session_id, session.id);
        assert_eq!(event.event.payload, EventPayload::SessionCreated(session));
    });

    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_message_inserted_reaches_session_and_kind_topics() {
    let router = started_router().await;
    let mut scoped = router.publisher().topic(session_topic("A")).subscribe();
    let mut by_kind = router
        .publisher()
        .topic(EventKind::MessageInserted.as_str())
        .subscribe();

    let message = Message::from_new(NewMessage::text("hi"));
    router.publish(SessionEvent::message_inserted("A", message.clone()));

    let expected = EventPayload::MessageInserted {
        session_id: "A".to_string(),
        message,
    };
    assert_matches!(next(&mut scoped).await, Some(Notification::Event(event)) => {
        assert_eq!(event.session_id, "A");
        assert_eq!(event.event.payload, expected);
    });
    assert_eq!(
        next(&mut by_kind).await,
        Some(Notification::Payload(expected))
    );

    router.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_deleted_session_topic_closes_after_grace_period() {
    let router = started_router().await;
    let topic = session_topic("A");
    let mut early = router.publisher().topic(&topic).subscribe();

    router.publish(SessionEvent::session_deleted("A"));

    assert_matches!(next(&mut early).await, Some(Notification::Event(event)) => {
        assert_eq!(event.kind(), EventKind::SessionDeleted);
    });

    sleep(Duration::from_secs(29)).await;
    assert!(router.publisher().contains(&topic));
    let mut late = router.publisher().topic(&topic).subscribe();

    sleep(Duration::from_secs(11)).await;
    assert_eq!(early.recv().await, None);
    assert_eq!(late.recv().await, None);
    assert!(!router.publisher().contains(&topic));

    // A subscription made after the close lands on a fresh, empty topic.
    let mut fresh = router.publisher().topic(&topic).subscribe();
    assert!(
        timeout(Duration::from_secs(5), fresh.recv())
            .await
            .is_err()
    );

    router.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_deletions_closes_every_session_topic() {
    let router = started_router().await;
    let ids: Vec<String> = (0..5).map(|i| format!("s{i}")).collect();
    let mut scoped: Vec<_> = ids
        .iter()
        .map(|id| router.publisher().topic(session_topic(id)).subscribe())
        .collect();

    for id in &ids {
        router.publish(SessionEvent::session_deleted(id.clone()));
    }

    for (id, subscriber) in ids.iter().zip(&mut scoped) {
        assert_matches!(next(subscriber).await, Some(Notification::Event(event)) => {
            assert_eq!(event.kind(), EventKind::SessionDeleted);
            assert_eq!(&event.session_id, id);
        });
    }

    sleep(DEFAULT_GRACE_PERIOD + Duration::from_secs(1)).await;

    for (id, subscriber) in ids.iter().zip(&mut scoped) {
        assert_eq!(subscriber.recv().await, None);
        assert!(!router.publisher().contains(&session_topic(id)));
    }

    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_event_stops_routing() {
    let router = started_router().await;
    let mut scoped = router.publisher().topic(session_topic("A")).subscribe();

    router.publish(SessionEvent::failed(
        "A",
        EventPayload::SessionDeleted("A".to_string()),
        "store unavailable",
    ));
    sleep(Duration::from_millis(50)).await;
    router.publish(SessionEvent::session_deleted("A"));

    assert!(
        timeout(Duration::from_millis(200), scoped.recv())
            .await
            .is_err()
    );
    assert_eq!(router.publisher().topic(SESSION_TOPIC).subscriber_count(), 0);

    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_pending_session_topics() {
    let router = started_router().await;
    let mut scoped = router.publisher().topic(session_topic("A")).subscribe();
    let mut global = router.publisher().topic(SESSION_TOPIC).subscribe();

    router.publish(SessionEvent::session_deleted("A"));
    assert!(next(&mut scoped).await.is_some());
    assert!(next(&mut global).await.is_some());

    timeout(Duration::from_secs(1), router.shutdown())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(scoped.recv().await, None);
    assert_eq!(global.recv().await, None);
}

#[tokio::test]
async fn test_start_twice_fails() {
    let router = started_router().await;

    assert_matches!(router.start().await, Err(Error::AlreadyStarted));

    router.shutdown().await.unwrap();
}

#[derive(Debug, thiserror::Error)]
#[error("broker unreachable")]
struct Unreachable;

impl BootableError for Unreachable {}

struct FailingReplication;

#[async_trait]
impl Bootable for FailingReplication {
    type Error = Unreachable;

    fn name(&self) -> &'static str {
        "failing"
    }

    async fn start(&self) -> Result<(), Unreachable> {
        Err(Unreachable)
    }

    async fn shutdown(&self) -> Result<(), Unreachable> {
        Ok(())
    }

    async fn wait(&self) {}
}

#[tokio::test]
async fn test_replication_failure_aborts_start() {
    let router = SessionEventRouter::with_replication(
        Publisher::default(),
        FailingReplication,
        RouterOptions::default(),
    );

    assert_matches!(router.start().await, Err(Error::Replication(_)));
}

#[tokio::test]
async fn test_replicated_events_are_routed_on_every_instance() {
    let hub = MemoryTransport::default();
    let mut routers = Vec::new();
    for _ in 0..2 {
        let publisher = Publisher::default();
        let bridge = MemoryReplicationBridge::new(publisher.clone(), hub.clone(), JsonCodec);
        let router =
            SessionEventRouter::with_replication(publisher, bridge, RouterOptions::default());
        router.start().await.unwrap();
        routers.push(router);
    }

    let mut local = routers[0].publisher().topic(session_topic("A")).subscribe();
    let mut remote = routers[1].publisher().topic(session_topic("A")).subscribe();

    let event = SessionEvent::message_deleted("A", "m1");
    routers[0].publish(event.clone());

    assert_eq!(next(&mut local).await, Some(Notification::Event(event.clone())));
    assert_eq!(next(&mut remote).await, Some(Notification::Event(event)));
    assert!(
        timeout(Duration::from_millis(200), local.recv())
            .await
            .is_err()
    );

    for router in &routers {
        router.shutdown().await.unwrap();
    }
}

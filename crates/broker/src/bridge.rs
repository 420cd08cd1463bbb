use crate::codec::Codec;
use crate::envelope::Envelope;
use crate::error::Error;
use crate::transport::{BrokerStream, BrokerTransport};

use std::sync::Arc;

use airsync_bootable::Bootable;
use airsync_events::{Notification, SESSION_QUEUE_CAPACITY, SESSION_TOPIC, SessionEvent};
use airsync_pubsub::Publisher;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};
use uuid::Uuid;

struct Shared<B, C> {
    transport: B,
    codec: C,
    publisher: Publisher<Notification>,
    client_id: String,
    last_event_id: Mutex<Option<String>>,
}

impl<B, C> Shared<B, C>
where
    B: BrokerTransport,
    C: Codec,
{
    /// Records `id` as the most recently seen event. Returns `false` if it
    /// already was.
    fn observe(&self, id: &str) -> bool {
        let mut last = self.last_event_id.lock();
        if last.as_deref() == Some(id) {
            return false;
        }
        *last = Some(id.to_string());
        true
    }

    async fn forward(&self, notification: Notification) -> Result<(), Error> {
        let Notification::Event(event) = notification else {
            return Ok(());
        };

        if !self.observe(event.id()) {
            debug!(event_id = %event.id(), "event already seen, not forwarding");
            return Ok(());
        }

        let payload = self
            .codec
            .encode(&Envelope::wrap(&event, &self.client_id))?;

        self.transport
            .publish(payload)
            .await
            .map_err(Error::transport)?;

        info!(
            broker = self.transport.name(),
            event_id = %event.id(),
            kind = %event.kind(),
            timestamp = event.event.timestamp,
            "published event"
        );

        Ok(())
    }

    fn receive(&self, bytes: &Bytes) -> Result<(), Error> {
        let envelope = self.codec.decode(bytes)?;

        if envelope.client_id == self.client_id {
            debug!(event_id = %envelope.id, "own event echoed back, discarding");
            return Ok(());
        }

        if !self.observe(&envelope.id) {
            debug!(event_id = %envelope.id, "duplicate event, discarding");
            return Ok(());
        }

        let event: SessionEvent = envelope.into_session_event()?;

        info!(
            broker = self.transport.name(),
            event_id = %event.id(),
            kind = %event.kind(),
            timestamp = event.event.timestamp,
            "received event"
        );

        self.publisher
            .topic(SESSION_TOPIC)
            .publish(Notification::Event(event));

        Ok(())
    }
}

/// Mirrors the local `session` topic to and from an external broker.
pub struct ReplicationBridge<B, C> {
    shared: Arc<Shared<B, C>>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl<B, C> ReplicationBridge<B, C>
where
    B: BrokerTransport,
    C: Codec,
{
    /// Creates a bridge with a fresh client id. Nothing happens until it is
    /// started.
    pub fn new(publisher: Publisher<Notification>, transport: B, codec: C) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                codec,
                publisher,
                client_id: Uuid::new_v4().to_string(),
                last_event_id: Mutex::new(None),
            }),
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// The id this instance tags its outgoing events with.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.shared.client_id
    }

    fn spawn_publishing(&self) {
        let subscriber = self
            .shared
            .publisher
            .topic(SESSION_TOPIC)
            .subscribe_with_capacity(SESSION_QUEUE_CAPACITY);
        let shared = self.shared.clone();
        let name = self.shared.transport.name();

        subscriber.for_each_async(
            &self.task_tracker,
            self.shutdown_token.clone(),
            move |notification| {
                let shared = shared.clone();
                async move { shared.forward(notification).await }
            },
            move |e| error!(broker = name, "publishing loop stopped: {e}"),
        );
    }

    fn spawn_receiving(&self, mut stream: BrokerStream<B::Error>) {
        let shared = self.shared.clone();
        let shutdown_token = self.shutdown_token.clone();
        let name = self.shared.transport.name();

        self.task_tracker.spawn(async move {
            let result = loop {
                let message = tokio::select! {
                    biased;
                    () = shutdown_token.cancelled() => break Ok(()),
                    message = stream.next() => message,
                };

                match message {
                    Some(Ok(bytes)) => {
                        if let Err(e) = shared.receive(&bytes) {
                            break Err(e);
                        }
                    }
                    Some(Err(e)) => break Err(Error::transport(e)),
                    None => break Err(Error::SubscriptionEnded),
                }
            };

            if let Err(e) = result {
                error!(broker = name, "receiving loop stopped: {e}");
            }
        });
    }
}

#[async_trait]
impl<B, C> Bootable for ReplicationBridge<B, C>
where
    B: BrokerTransport,
    C: Codec,
{
    type Error = Error;

    fn name(&self) -> &str {
        self.shared.transport.name()
    }

    async fn start(&self) -> Result<(), Error> {
        if self.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        info!(
            broker = self.shared.transport.name(),
            codec = self.shared.codec.name(),
            client_id = %self.shared.client_id,
            "connecting to broker"
        );

        let stream = self
            .shared
            .transport
            .subscribe()
            .await
            .map_err(Error::transport)?;

        self.spawn_publishing();
        self.spawn_receiving(stream);

        self.task_tracker.close();

        info!(
            broker = self.shared.transport.name(),
            "replicating topic {SESSION_TOPIC}"
        );

        Ok(())
    }

    async fn shutdown(&self) -> Result<(), Error> {
        info!(broker = self.shared.transport.name(), "replication shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.wait().await;

        info!(broker = self.shared.transport.name(), "replication shutdown");

        Ok(())
    }

    async fn wait(&self) {
        self.task_tracker.wait().await;
    }
}

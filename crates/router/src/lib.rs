//! Fans domain events out from the global `session` topic.
//!
//! Every [`SessionEvent`] published on the global topic is republished twice:
//! its bare payload onto the topic named after its kind, and the whole event
//! onto the topic scoped to its session. When a session is deleted its scoped
//! topic is closed after a grace period, so clients still streaming or
//! polling see the deletion before their channel goes away.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::time::Duration;

use airsync_bootable::Bootable;
use airsync_events::{
    EventKind, Notification, SESSION_QUEUE_CAPACITY, SESSION_TOPIC, SessionEvent, session_topic,
};
use airsync_pubsub::Publisher;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

/// How long a deleted session's topic stays open.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// Options for the router.
#[derive(Clone, Copy, Debug)]
pub struct RouterOptions {
    /// Delay between a session's deletion and the closing of its topic.
    pub grace_period: Duration,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Replication placeholder for a single-instance deployment.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReplication;

#[async_trait]
impl Bootable for NoReplication {
    type Error = Error;

    fn name(&self) -> &'static str {
        "none"
    }

    async fn start(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn wait(&self) {}
}

#[derive(Clone)]
struct Fanout {
    publisher: Publisher<Notification>,
    grace_period: Duration,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl Fanout {
    fn route(&self, notification: Notification) -> Result<(), Error> {
        let Notification::Event(event) = notification else {
            return Ok(());
        };

        if let Some(message) = event.error() {
            return Err(Error::EventFailed {
                event_id: event.id().to_string(),
                message: message.to_string(),
            });
        }

        let kind = event.kind();
        let session_id = event.session_id.clone();

        self.publisher
            .topic(kind.as_str())
            .publish(Notification::Payload(event.event.payload.clone()));
        let delivered = self
            .publisher
            .topic(session_topic(&session_id))
            .publish(Notification::Event(event));

        debug!(%session_id, %kind, delivered, "routed event");

        if kind == EventKind::SessionDeleted {
            self.close_after_grace(session_id);
        }

        Ok(())
    }

    fn close_after_grace(&self, session_id: String) {
        let publisher = self.publisher.clone();
        let shutdown_token = self.shutdown_token.clone();
        let grace_period = self.grace_period;

        self.task_tracker.spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(grace_period) => {}
                () = shutdown_token.cancelled() => {}
            }

            publisher.topic(session_topic(&session_id)).close();
            info!(%session_id, "closed session topic");
        });
    }
}

/// Routes events from the global topic and owns the optional replication
/// service.
pub struct SessionEventRouter<R = NoReplication> {
    fanout: Fanout,
    replication: R,
}

impl SessionEventRouter<NoReplication> {
    /// A router for a single instance.
    #[must_use]
    pub fn new(publisher: Publisher<Notification>, options: RouterOptions) -> Self {
        Self::with_replication(publisher, NoReplication, options)
    }
}

impl<R> SessionEventRouter<R>
where
    R: Bootable,
{
    /// A router that also starts and stops `replication`.
    pub fn with_replication(
        publisher: Publisher<Notification>,
        replication: R,
        options: RouterOptions,
    ) -> Self {
        Self {
            fanout: Fanout {
                publisher,
                grace_period: options.grace_period,
                shutdown_token: CancellationToken::new(),
                task_tracker: TaskTracker::new(),
            },
            replication,
        }
    }

    /// The registry events are routed through.
    #[must_use]
    pub const fn publisher(&self) -> &Publisher<Notification> {
        &self.fanout.publisher
    }

    /// Publishes `event` on the global topic.
    pub fn publish(&self, event: SessionEvent) {
        debug!(event_id = %event.id(), kind = %event.kind(), "publishing event");
        self.fanout
            .publisher
            .topic(SESSION_TOPIC)
            .publish(Notification::Event(event));
    }
}

#[async_trait]
impl<R> Bootable for SessionEventRouter<R>
where
    R: Bootable,
{
    type Error = Error;

    fn name(&self) -> &'static str {
        "router"
    }

    async fn start(&self) -> Result<(), Error> {
        if self.fanout.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        let fanout = self.fanout.clone();
        self.fanout
            .publisher
            .topic(SESSION_TOPIC)
            .subscribe_with_capacity(SESSION_QUEUE_CAPACITY)
            .for_each_async(
                &self.fanout.task_tracker,
                self.fanout.shutdown_token.clone(),
                move |notification| {
                    let result = fanout.route(notification);
                    async move { result }
                },
                |e| error!("event routing stopped: {e}"),
            );

        self.fanout.task_tracker.close();

        if let Err(e) = self.replication.start().await {
            self.fanout.shutdown_token.cancel();
            return Err(Error::Replication(Box::new(e)));
        }

        info!(replication = self.replication.name(), "router started");

        Ok(())
    }

    async fn shutdown(&self) -> Result<(), Error> {
        info!("router shutting down...");

        self.fanout.publisher.topic(SESSION_TOPIC).close();
        self.fanout.shutdown_token.cancel();

        let replication = self
            .replication
            .shutdown()
            .await
            .map_err(|e| Error::Replication(Box::new(e)));

        self.fanout.task_tracker.wait().await;

        info!("router shutdown");

        replication
    }

    async fn wait(&self) {
        self.fanout.task_tracker.wait().await;
    }
}

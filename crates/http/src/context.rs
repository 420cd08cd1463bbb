use crate::cleanup::CleanupService;

use std::sync::Arc;
use std::time::Duration;

use airsync_events::{Notification, SESSION_TOPIC, SessionEvent};
use airsync_pubsub::Publisher;
use airsync_repository::SessionRepository;
use tokio_util::sync::CancellationToken;

/// Idle time after which WebSocket clients are pinged and SSE clients get a
/// keep-alive.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(30);

/// How long a long-poll request waits for an event.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for the HTTP surface.
#[derive(Clone, Copy, Debug)]
pub struct HttpOptions {
    /// See [`DEFAULT_HEARTBEAT`].
    pub heartbeat: Duration,

    /// See [`DEFAULT_POLL_TIMEOUT`].
    pub poll_timeout: Duration,

    /// Allow requests from any origin.
    pub enable_cors: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            heartbeat: DEFAULT_HEARTBEAT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            enable_cors: false,
        }
    }
}

/// State shared by every handler.
#[derive(Clone)]
pub struct HttpContext<R>
where
    R: SessionRepository,
{
    /// Session storage.
    pub repository: R,

    /// Registry the events are published to and streamed from.
    pub publisher: Publisher<Notification>,

    /// The rate-limited cleanup job.
    pub cleanup: Arc<CleanupService<R>>,

    /// Handler options.
    pub options: HttpOptions,

    /// Cancelled when the server shuts down. Streaming adapters end on it.
    pub shutdown_token: CancellationToken,
}

impl<R> HttpContext<R>
where
    R: SessionRepository,
{
    /// Builds a context with its own shutdown token.
    pub fn new(
        repository: R,
        publisher: Publisher<Notification>,
        cleanup: CleanupService<R>,
        options: HttpOptions,
    ) -> Self {
        Self {
            repository,
            publisher,
            cleanup: Arc::new(cleanup),
            options,
            shutdown_token: CancellationToken::new(),
        }
    }

    pub(crate) fn publish(&self, event: SessionEvent) {
        self.publisher
            .topic(SESSION_TOPIC)
            .publish(Notification::Event(event));
    }
}

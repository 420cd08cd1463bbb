//! Session data model and the events that flow through the topic registry.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod client;
mod error;
mod event;
mod model;

pub use client::ClientEvent;
pub use error::Error;
pub use event::{Event, EventKind, EventPayload, Notification, SessionEvent};
pub use model::{Message, NewMessage, Session};

/// Name of the global topic every domain event is first published to.
pub const SESSION_TOPIC: &str = "session";

/// Queue length of the router's and the replication bridge's subscriptions
/// on [`SESSION_TOPIC`]. Sized for bursts such as a cleanup run deleting many
/// sessions at once.
pub const SESSION_QUEUE_CAPACITY: usize = 1024;

/// Name of the topic scoped to one session.
#[must_use]
pub fn session_topic(session_id: &str) -> String {
    format!("{SESSION_TOPIC}:{session_id}")
}

/// Current time as milliseconds since the Unix epoch.
#[must_use]
pub fn timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

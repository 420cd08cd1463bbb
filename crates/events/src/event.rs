use crate::model::{Message, Session};
use crate::timestamp_millis;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four kinds of session event. The string form doubles as the name of
/// the per-kind topic.
#[derive(Clone, Copy, Debug, Deserialize, Hash, PartialEq, Eq, Serialize)]
pub enum EventKind {
    /// A session was created.
    #[serde(rename = "session.created")]
    SessionCreated,

    /// A session was deleted.
    #[serde(rename = "session.deleted")]
    SessionDeleted,

    /// A message was added to a session.
    #[serde(rename = "message.inserted")]
    MessageInserted,

    /// A message was removed from a session.
    #[serde(rename = "message.deleted")]
    MessageDeleted,
}

impl EventKind {
    /// Wire and topic name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionCreated => "session.created",
            Self::SessionDeleted => "session.deleted",
            Self::MessageInserted => "message.inserted",
            Self::MessageDeleted => "message.deleted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data")]
pub enum EventPayload {
    /// The full session as created.
    #[serde(rename = "session.created")]
    SessionCreated(Session),

    /// Id of the deleted session.
    #[serde(rename = "session.deleted")]
    SessionDeleted(String),

    /// A stored message and the session it went into.
    #[serde(rename = "message.inserted")]
    MessageInserted {
        /// Owning session.
        session_id: String,
        /// The stored message.
        message: Message,
    },

    /// A removed message.
    #[serde(rename = "message.deleted")]
    MessageDeleted {
        /// Owning session.
        session_id: String,
        /// Id of the removed message.
        message_id: String,
    },
}

impl EventPayload {
    /// The kind tag of this payload.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::SessionCreated(_) => EventKind::SessionCreated,
            Self::SessionDeleted(_) => EventKind::SessionDeleted,
            Self::MessageInserted { .. } => EventKind::MessageInserted,
            Self::MessageDeleted { .. } => EventKind::MessageDeleted,
        }
    }

    /// Id of the session the payload concerns.
    #[must_use]
    pub fn session_id(&self) -> &str {
        match self {
            Self::SessionCreated(session) => &session.id,
            Self::SessionDeleted(id) => id,
            Self::MessageInserted { session_id, .. } | Self::MessageDeleted { session_id, .. } => {
                session_id
            }
        }
    }

    /// The payload body without its tag, as clients see it.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be represented as JSON.
    pub fn data(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::SessionCreated(session) => serde_json::to_value(session),
            Self::SessionDeleted(id) => serde_json::to_value(id),
            Self::MessageInserted {
                session_id,
                message,
            } => Ok(serde_json::json!({
                "session_id": session_id,
                "message": message,
            })),
            Self::MessageDeleted {
                session_id,
                message_id,
            } => Ok(serde_json::json!({
                "session_id": session_id,
                "message_id": message_id,
            })),
        }
    }
}

/// One occurrence of a domain event.
///
/// `id` is assigned once at creation and travels unchanged through
/// replication, which is what duplicate suppression keys on.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Unique id of this occurrence.
    pub id: String,

    /// What happened.
    pub payload: EventPayload,

    /// Set when the producer failed. Consumers treat such events as failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
}

impl Event {
    /// Kind of the payload.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// An [`Event`] together with the session it concerns.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct SessionEvent {
    /// The session the event concerns.
    pub session_id: String,

    /// The event itself.
    pub event: Event,
}

impl SessionEvent {
    /// Wraps `payload` in a new event with a fresh id and timestamp.
    #[must_use]
    pub fn new(session_id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            session_id: session_id.into(),
            event: Event {
                id: Uuid::new_v4().to_string(),
                payload,
                error: None,
                timestamp: timestamp_millis(),
            },
        }
    }

    /// Like [`SessionEvent::new`] but marks the event as failed.
    #[must_use]
    pub fn failed(
        session_id: impl Into<String>,
        payload: EventPayload,
        error: impl Into<String>,
    ) -> Self {
        let mut event = Self::new(session_id, payload);
        event.event.error = Some(error.into());
        event
    }

    /// A `session.created` event for `session`.
    #[must_use]
    pub fn session_created(session: Session) -> Self {
        Self::new(session.id.clone(), EventPayload::SessionCreated(session))
    }

    /// A `session.deleted` event.
    #[must_use]
    pub fn session_deleted(session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self::new(session_id.clone(), EventPayload::SessionDeleted(session_id))
    }

    /// A `message.inserted` event.
    #[must_use]
    pub fn message_inserted(session_id: impl Into<String>, message: Message) -> Self {
        let session_id = session_id.into();
        Self::new(
            session_id.clone(),
            EventPayload::MessageInserted {
                session_id,
                message,
            },
        )
    }

    /// A `message.deleted` event.
    #[must_use]
    pub fn message_deleted(session_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self::new(
            session_id.clone(),
            EventPayload::MessageDeleted {
                session_id,
                message_id: message_id.into(),
            },
        )
    }

    /// Unique id of the wrapped event.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.event.id
    }

    /// Kind of the wrapped event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// The producer's error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.event.error.as_deref()
    }
}

/// Item type carried by every topic in the registry.
///
/// The global and session-scoped topics carry whole events. Per-kind topics
/// carry only the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// A full event.
    Event(SessionEvent),

    /// A bare payload, as published on a per-kind topic.
    Payload(EventPayload),
}

impl From<SessionEvent> for Notification {
    fn from(event: SessionEvent) -> Self {
        Self::Event(event)
    }
}

impl From<EventPayload> for Notification {
    fn from(payload: EventPayload) -> Self {
        Self::Payload(payload)
    }
}

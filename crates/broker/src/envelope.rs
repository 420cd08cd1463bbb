use crate::error::Error;

use airsync_events::{Event, EventKind, EventPayload, SessionEvent};
use serde::{Deserialize, Serialize};

/// A session event as it travels through the broker, tagged with the
/// instance that sent it.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Envelope {
    /// Event id, unchanged from the originating instance.
    pub id: String,

    /// Event kind.
    pub kind: EventKind,

    /// The session the event concerns.
    pub session_id: String,

    /// Domain payload.
    pub payload: EventPayload,

    /// Producer error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Event time in epoch milliseconds.
    pub timestamp: i64,

    /// Id of the sending instance.
    pub client_id: String,
}

impl Envelope {
    /// Wraps `event` for sending from instance `client_id`.
    #[must_use]
    pub fn wrap(event: &SessionEvent, client_id: &str) -> Self {
        Self {
            id: event.event.id.clone(),
            kind: event.kind(),
            session_id: event.session_id.clone(),
            payload: event.event.payload.clone(),
            error: event.event.error.clone(),
            timestamp: event.event.timestamp,
            client_id: client_id.to_string(),
        }
    }

    /// Unwraps the envelope back into the event it carried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KindMismatch`] if the declared kind disagrees with the
    /// payload.
    pub fn into_session_event(self) -> Result<SessionEvent, Error> {
        let actual = self.payload.kind();
        if self.kind != actual {
            return Err(Error::KindMismatch {
                declared: self.kind,
                actual,
            });
        }

        Ok(SessionEvent {
            session_id: self.session_id,
            event: Event {
                id: self.id,
                payload: self.payload,
                error: self.error,
                timestamp: self.timestamp,
            },
        })
    }
}

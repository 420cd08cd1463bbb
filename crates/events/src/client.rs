use crate::error::Error;
use crate::event::SessionEvent;

use serde::{Deserialize, Serialize};

/// The shape WebSocket, SSE and long-poll clients receive.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClientEvent {
    /// Event kind, e.g. `message.inserted`.
    pub event: String,

    /// The payload without its tag.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,

    /// Producer error, if the event failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Event time in epoch milliseconds.
    pub timestamp: i64,
}

impl TryFrom<&SessionEvent> for ClientEvent {
    type Error = Error;

    fn try_from(event: &SessionEvent) -> Result<Self, Error> {
        Ok(Self {
            event: event.kind().as_str().to_string(),
            data: event.event.payload.data()?,
            error: event.event.error.clone(),
            timestamp: event.event.timestamp,
        })
    }
}

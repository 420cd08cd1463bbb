use crate::timestamp_millis;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A conversation holding an ordered list of messages, newest first.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Unique session id.
    pub id: String,

    /// Messages, newest first.
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Creation time in epoch milliseconds.
    pub created_at: i64,
}

impl Session {
    /// A fresh, empty session with a random id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            created_at: timestamp_millis(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// A message stored in a session.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Unique message id.
    pub id: String,

    /// Whether clients should mask the body by default.
    #[serde(default)]
    pub sensitive: bool,

    /// Text content.
    #[serde(default)]
    pub body: String,

    /// Id of an uploaded attachment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,

    /// Creation time in epoch milliseconds.
    pub created_at: i64,
}

impl Message {
    /// Stamps `new` with a random id and the current time.
    #[must_use]
    pub fn from_new(new: NewMessage) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sensitive: new.sensitive,
            body: new.body,
            attachment_id: new.attachment_id,
            created_at: timestamp_millis(),
        }
    }
}

/// Client input for a message that has not been stored yet.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct NewMessage {
    /// See [`Message::sensitive`].
    #[serde(default)]
    pub sensitive: bool,

    /// See [`Message::body`].
    #[serde(default)]
    pub body: String,

    /// See [`Message::attachment_id`].
    #[serde(default)]
    pub attachment_id: Option<String>,
}

impl NewMessage {
    /// A plain text message.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Whether the message carries neither text nor an attachment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty() && self.attachment_id.as_deref().is_none_or(str::is_empty)
    }
}

use std::error::Error as StdError;

use thiserror::Error;

/// Errors that can occur in a session repository.
#[derive(Debug, Error)]
pub enum Error {
    /// No session with the given id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// No message with the given id in the session.
    #[error("message not found: {0}")]
    MessageNotFound(String),

    /// The message has neither a body nor an attachment.
    #[error("message must have a body or an attachment")]
    EmptyMessage,

    /// The underlying store failed.
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

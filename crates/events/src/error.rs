use thiserror::Error;

/// Errors produced while shaping events for clients.
#[derive(Debug, Error)]
pub enum Error {
    /// Payload could not be turned into JSON.
    #[error("failed to serialize event payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

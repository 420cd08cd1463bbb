use thiserror::Error;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// Errors that can occur on the in-memory hub.
#[derive(Debug, Error)]
pub enum Error {
    /// A listener fell behind and missed messages.
    #[error("memory hub listener fell behind: {0}")]
    Lagged(#[from] BroadcastStreamRecvError),
}

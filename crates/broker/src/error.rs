use std::error::Error as StdError;

use airsync_bootable::BootableError;
use airsync_events::EventKind;
use thiserror::Error;

/// Errors that can occur while replicating events.
#[derive(Debug, Error)]
pub enum Error {
    /// The bridge has already been started.
    #[error("the replication bridge has already been started")]
    AlreadyStarted,

    /// JSON encoding or decoding failed.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// CBOR encoding failed.
    #[error("cbor encode error: {0}")]
    CborEncode(#[from] ciborium::ser::Error<std::io::Error>),

    /// CBOR decoding failed.
    #[error("cbor decode error: {0}")]
    CborDecode(#[from] ciborium::de::Error<std::io::Error>),

    /// The envelope's kind does not match its payload.
    #[error("envelope kind {declared} does not match payload kind {actual}")]
    KindMismatch {
        /// Kind named in the envelope.
        declared: EventKind,
        /// Kind of the payload.
        actual: EventKind,
    },

    /// The broker connection failed.
    #[error("broker transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// The broker closed the subscription.
    #[error("broker subscription ended")]
    SubscriptionEnded,
}

impl Error {
    pub(crate) fn transport<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Transport(Box::new(error))
    }
}

impl BootableError for Error {}

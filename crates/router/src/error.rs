use std::error::Error as StdError;

use airsync_bootable::BootableError;
use thiserror::Error;

/// Errors that can occur in the router.
#[derive(Debug, Error)]
pub enum Error {
    /// The router has already been started.
    #[error("the router has already been started")]
    AlreadyStarted,

    /// An event arrived carrying a producer error.
    #[error("event {event_id} failed: {message}")]
    EventFailed {
        /// Id of the failed event.
        event_id: String,
        /// The producer's error.
        message: String,
    },

    /// The replication service failed to start or stop.
    #[error("replication error: {0}")]
    Replication(#[source] Box<dyn StdError + Send + Sync>),
}

impl BootableError for Error {}

//! In-process broker transport.
//!
//! Every clone of a [`MemoryTransport`] is attached to the same hub, so a
//! test or a single-node deployment can run several bridges against it as if
//! they were separate instances behind a real broker.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use airsync_broker::{BrokerStream, BrokerTransport, JsonCodec, ReplicationBridge};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::trace;

/// Messages the hub buffers per listener before it starts lagging.
pub const DEFAULT_HUB_CAPACITY: usize = 1024;

/// A bridge over the in-memory hub.
pub type MemoryReplicationBridge = ReplicationBridge<MemoryTransport, JsonCodec>;

/// Handle on an in-process broadcast hub.
#[derive(Clone, Debug)]
pub struct MemoryTransport {
    sender: broadcast::Sender<Bytes>,
}

impl MemoryTransport {
    /// Creates a new, empty hub.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Number of active listeners on the hub.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}

#[async_trait]
impl BrokerTransport for MemoryTransport {
    type Error = Error;

    fn name(&self) -> &'static str {
        "memory"
    }

    async fn publish(&self, payload: Bytes) -> Result<(), Error> {
        // Sending with nobody listening is not a failure for a broadcast hub.
        if self.sender.send(payload).is_err() {
            trace!("no listeners on memory hub");
        }
        Ok(())
    }

    async fn subscribe(&self) -> Result<BrokerStream<Error>, Error> {
        let stream =
            BroadcastStream::new(self.sender.subscribe()).map(|message| message.map_err(Error::from));

        Ok(stream.boxed())
    }
}

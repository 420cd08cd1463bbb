use std::error::Error as StdError;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Messages arriving from the broker.
pub type BrokerStream<E> = BoxStream<'static, Result<Bytes, E>>;

/// A broker channel that every instance both publishes to and listens on.
#[async_trait]
pub trait BrokerTransport
where
    Self: Clone + Debug + Send + Sync + 'static,
{
    /// The error type for the transport.
    type Error: StdError + Send + Sync + 'static;

    /// Short backend name for log lines.
    fn name(&self) -> &'static str;

    /// Sends one encoded message to every listener, including this one.
    async fn publish(&self, payload: Bytes) -> Result<(), Self::Error>;

    /// Starts listening on the channel.
    async fn subscribe(&self) -> Result<BrokerStream<Self::Error>, Self::Error>;
}

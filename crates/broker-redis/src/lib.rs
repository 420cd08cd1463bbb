//! Redis pub/sub transport.
//!
//! Every instance publishes JSON envelopes to, and subscribes to, a single
//! channel.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::fmt::{self, Debug};

use airsync_broker::{BrokerStream, BrokerTransport, JsonCodec, ReplicationBridge};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::info;

/// A bridge over Redis.
pub type RedisReplicationBridge = ReplicationBridge<RedisTransport, JsonCodec>;

/// Options for connecting to Redis.
#[derive(Clone, Debug)]
pub struct RedisOptions {
    /// Connection URL, e.g. `redis://:password@host:6379`.
    pub url: String,

    /// Channel shared by every instance.
    pub channel: String,
}

impl Default for RedisOptions {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            channel: "session".to_string(),
        }
    }
}

/// Redis pub/sub channel.
#[derive(Clone)]
pub struct RedisTransport {
    client: redis::Client,
    connection: MultiplexedConnection,
    channel: String,
}

impl Debug for RedisTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisTransport")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl RedisTransport {
    /// Connects to Redis and checks the connection with a `PING`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server is unreachable.
    pub async fn connect(options: RedisOptions) -> Result<Self, Error> {
        let client = redis::Client::open(options.url.as_str())?;
        let mut connection = client.get_multiplexed_async_connection().await?;

        redis::cmd("PING")
            .query_async::<String>(&mut connection)
            .await?;

        info!(channel = %options.channel, "connected to redis");

        Ok(Self {
            client,
            connection,
            channel: options.channel,
        })
    }
}

#[async_trait]
impl BrokerTransport for RedisTransport {
    type Error = Error;

    fn name(&self) -> &'static str {
        "redis"
    }

    async fn publish(&self, payload: Bytes) -> Result<(), Error> {
        let mut connection = self.connection.clone();
        let _receivers: i64 = connection.publish(&self.channel, payload.as_ref()).await?;
        Ok(())
    }

    async fn subscribe(&self) -> Result<BrokerStream<Error>, Error> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(&self.channel).await?;

        let stream = pubsub
            .into_on_message()
            .map(|message| Ok::<_, Error>(Bytes::copy_from_slice(message.get_payload_bytes())));

        Ok(stream.boxed())
    }
}

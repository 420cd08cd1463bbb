//! NATS transport.
//!
//! Every instance publishes CBOR envelopes to, and subscribes to, one
//! subject.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use airsync_broker::{BrokerStream, BrokerTransport, CborCodec, ReplicationBridge};
use async_nats::Client;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tracing::info;

/// A bridge over NATS.
pub type NatsReplicationBridge = ReplicationBridge<NatsTransport, CborCodec>;

/// Options for connecting to NATS.
#[derive(Clone, Debug)]
pub struct NatsOptions {
    /// Server URL.
    pub url: String,

    /// Subject shared by every instance.
    pub subject: String,

    /// Name reported to the server.
    pub client_name: String,
}

impl Default for NatsOptions {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
            subject: "session".to_string(),
            client_name: "airsync".to_string(),
        }
    }
}

/// NATS subject.
#[derive(Clone, Debug)]
pub struct NatsTransport {
    client: Client,
    subject: String,
}

impl NatsTransport {
    /// Connects to the NATS server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable.
    pub async fn connect(options: NatsOptions) -> Result<Self, Error> {
        let connect_options = async_nats::ConnectOptions::new().name(options.client_name);
        let client = async_nats::connect_with_options(options.url.as_str(), connect_options).await?;

        info!(subject = %options.subject, "connected to nats");

        Ok(Self::from_client(client, options.subject))
    }

    /// Wraps an already connected client.
    #[must_use]
    pub const fn from_client(client: Client, subject: String) -> Self {
        Self { client, subject }
    }
}

#[async_trait]
impl BrokerTransport for NatsTransport {
    type Error = Error;

    fn name(&self) -> &'static str {
        "nats"
    }

    async fn publish(&self, payload: Bytes) -> Result<(), Error> {
        self.client.publish(self.subject.clone(), payload).await?;
        Ok(())
    }

    async fn subscribe(&self) -> Result<BrokerStream<Error>, Error> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;

        Ok(subscriber
            .map(|message| Ok::<_, Error>(message.payload))
            .boxed())
    }
}

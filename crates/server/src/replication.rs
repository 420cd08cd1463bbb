use crate::{Args, BrokerKind, Error};

use airsync_bootable::Bootable;
use airsync_broker::{CborCodec, JsonCodec};
use airsync_broker_memory::{MemoryReplicationBridge, MemoryTransport};
use airsync_broker_nats::{NatsOptions, NatsReplicationBridge, NatsTransport};
use airsync_broker_redis::{RedisOptions, RedisReplicationBridge, RedisTransport};
use airsync_events::Notification;
use airsync_pubsub::Publisher;
use async_trait::async_trait;

/// The replication backend selected on the command line.
pub enum Replication {
    /// Events stay on this instance.
    None,
    /// Bridge over an in-process hub.
    Memory(MemoryReplicationBridge),
    /// Bridge over a Redis channel, JSON encoded.
    Redis(RedisReplicationBridge),
    /// Bridge over a NATS subject, CBOR encoded.
    Nats(NatsReplicationBridge),
}

impl Replication {
    /// Connects the configured broker. A connection failure is returned so
    /// startup can abort.
    pub async fn connect(args: &Args, publisher: Publisher<Notification>) -> Result<Self, Error> {
        Ok(match args.broker {
            BrokerKind::None => Self::None,
            BrokerKind::Memory => Self::Memory(MemoryReplicationBridge::new(
                publisher,
                MemoryTransport::default(),
                JsonCodec,
            )),
            BrokerKind::Redis => {
                let transport = RedisTransport::connect(RedisOptions {
                    url: args.redis_url.clone(),
                    channel: args.redis_channel.clone(),
                })
                .await?;
                Self::Redis(RedisReplicationBridge::new(publisher, transport, JsonCodec))
            }
            BrokerKind::Nats => {
                let transport = NatsTransport::connect(NatsOptions {
                    url: args.nats_url.clone(),
                    subject: args.nats_subject.clone(),
                    ..NatsOptions::default()
                })
                .await?;
                Self::Nats(NatsReplicationBridge::new(publisher, transport, CborCodec))
            }
        })
    }
}

#[async_trait]
impl Bootable for Replication {
    type Error = airsync_broker::Error;

    fn name(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Memory(bridge) => bridge.name(),
            Self::Redis(bridge) => bridge.name(),
            Self::Nats(bridge) => bridge.name(),
        }
    }

    async fn start(&self) -> Result<(), Self::Error> {
        match self {
            Self::None => Ok(()),
            Self::Memory(bridge) => bridge.start().await,
            Self::Redis(bridge) => bridge.start().await,
            Self::Nats(bridge) => bridge.start().await,
        }
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        match self {
            Self::None => Ok(()),
            Self::Memory(bridge) => bridge.shutdown().await,
            Self::Redis(bridge) => bridge.shutdown().await,
            Self::Nats(bridge) => bridge.shutdown().await,
        }
    }

    async fn wait(&self) {
        match self {
            Self::None => {}
            Self::Memory(bridge) => bridge.wait().await,
            Self::Redis(bridge) => bridge.wait().await,
            Self::Nats(bridge) => bridge.wait().await,
        }
    }
}

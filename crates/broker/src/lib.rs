//! Replication of the global session topic across server instances.
//!
//! A [`ReplicationBridge`] mirrors every event published on the local
//! `session` topic to an external broker, and feeds events that other
//! instances published back into the local topic. Each instance tags what it
//! sends with its own client id so its own events are not applied twice, and
//! the most recently seen event id suppresses immediate redeliveries.
//!
//! The broker itself is abstracted behind [`BrokerTransport`]; the wire
//! format behind [`Codec`].
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod bridge;
mod codec;
mod envelope;
mod error;
mod transport;

pub use bridge::ReplicationBridge;
pub use codec::{CborCodec, Codec, JsonCodec};
pub use envelope::Envelope;
pub use error::Error;
pub use transport::{BrokerStream, BrokerTransport};

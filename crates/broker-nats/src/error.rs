use thiserror::Error;

/// Errors that can occur talking to NATS.
#[derive(Debug, Error)]
pub enum Error {
    /// Could not connect to the server.
    #[error("failed to connect to nats: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// Could not publish a message.
    #[error("failed to publish to nats: {0}")]
    Publish(#[from] async_nats::PublishError),

    /// Could not subscribe to the subject.
    #[error("failed to subscribe to nats: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),
}

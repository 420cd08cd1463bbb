use thiserror::Error;

/// Errors that can occur talking to Redis.
#[derive(Debug, Error)]
pub enum Error {
    /// Error from the Redis client.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

//! Storage of sessions and their messages.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod memory;

pub use error::Error;
pub use memory::MemorySessionRepository;

use airsync_events::{Message, NewMessage, Session};
use async_trait::async_trait;

/// CRUD access to sessions.
#[async_trait]
pub trait SessionRepository
where
    Self: Clone + Send + Sync + 'static,
{
    /// Creates and stores an empty session.
    async fn create(&self) -> Result<Session, Error>;

    /// Looks up a session with its messages.
    async fn find(&self, id: &str) -> Result<Session, Error>;

    /// Removes a session and its messages.
    async fn delete(&self, id: &str) -> Result<(), Error>;

    /// Stores a message at the front of a session.
    async fn insert_message(&self, id: &str, message: NewMessage) -> Result<Message, Error>;

    /// Removes one message from a session.
    async fn delete_message(&self, id: &str, message_id: &str) -> Result<(), Error>;

    /// Sessions created before `before` (epoch milliseconds).
    async fn find_before(&self, before: i64) -> Result<Vec<Session>, Error>;

    /// Removes every listed session that exists and returns how many were
    /// removed.
    async fn delete_many(&self, ids: &[String]) -> Result<usize, Error>;
}

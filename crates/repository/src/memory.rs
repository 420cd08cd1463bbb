use crate::SessionRepository;
use crate::error::Error;

use std::collections::HashMap;
use std::sync::Arc;

use airsync_events::{Message, NewMessage, Session};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

/// Sessions kept in process memory. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionRepository {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemorySessionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `session` as is, replacing any session with the same id.
    pub fn insert(&self, session: Session) {
        self.sessions.write().insert(session.id.clone(), session);
    }

    /// Number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no session is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create(&self) -> Result<Session, Error> {
        let session = Session::new();
        self.insert(session.clone());
        debug!(session_id = %session.id, "session stored");
        Ok(session)
    }

    async fn find(&self, id: &str) -> Result<Session, Error> {
        self.sessions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        self.sessions
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    async fn insert_message(&self, id: &str, message: NewMessage) -> Result<Message, Error> {
        if message.is_empty() {
            return Err(Error::EmptyMessage);
        }

        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        let message = Message::from_new(message);
        session.messages.insert(0, message.clone());

        Ok(message)
    }

    async fn delete_message(&self, id: &str, message_id: &str) -> Result<(), Error> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        let position = session
            .messages
            .iter()
            .position(|message| message.id == message_id)
            .ok_or_else(|| Error::MessageNotFound(message_id.to_string()))?;
        session.messages.remove(position);

        Ok(())
    }

    async fn find_before(&self, before: i64) -> Result<Vec<Session>, Error> {
        Ok(self
            .sessions
            .read()
            .values()
            .filter(|session| session.created_at < before)
            .cloned()
            .collect())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<usize, Error> {
        let mut sessions = self.sessions.write();
        Ok(ids.iter().filter(|id| sessions.remove(*id).is_some()).count())
    }
}

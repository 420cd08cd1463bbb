use crate::error::Error;

use std::time::Duration;

use airsync_events::{Notification, SESSION_TOPIC, SessionEvent};
use airsync_pubsub::Publisher;
use airsync_repository::SessionRepository;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

/// Options for the cleanup job.
#[derive(Clone, Copy, Debug)]
pub struct CleanupOptions {
    /// Minimum time between two runs.
    pub interval: Duration,

    /// Sessions older than this are deleted.
    pub max_age: Duration,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            max_age: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Deletes expired sessions and announces each deletion.
pub struct CleanupService<R> {
    repository: R,
    publisher: Publisher<Notification>,
    options: CleanupOptions,
    next_run: Mutex<Option<DateTime<Utc>>>,
}

impl<R> CleanupService<R>
where
    R: SessionRepository,
{
    /// Creates the job. The first run is allowed immediately.
    pub fn new(repository: R, publisher: Publisher<Notification>, options: CleanupOptions) -> Self {
        Self {
            repository,
            publisher,
            options,
            next_run: Mutex::new(None),
        }
    }

    /// Runs the job and returns how many sessions were deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CleanupTooEarly`] if the previous run was less than one
    /// interval ago, or the repository error if the store fails.
    pub async fn run(&self) -> Result<usize, Error> {
        let mut next_run = self.next_run.lock().await;
        let now = Utc::now();

        if let Some(allowed) = next_run.filter(|allowed| now < *allowed) {
            return Err(Error::CleanupTooEarly { next_run: allowed });
        }

        let deadline = now - self.options.max_age;
        info!(%deadline, "deleting old sessions");

        let ids: Vec<String> = self
            .repository
            .find_before(deadline.timestamp_millis())
            .await?
            .into_iter()
            .map(|session| session.id)
            .collect();
        let deleted = self.repository.delete_many(&ids).await?;

        let topic = self.publisher.topic(SESSION_TOPIC);
        for id in ids {
            topic.publish(Notification::Event(SessionEvent::session_deleted(id)));
        }

        *next_run = Some(now + self.options.interval);
        info!(deleted, "deleted old sessions");

        Ok(deleted)
    }
}

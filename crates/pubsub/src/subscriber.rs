use crate::topic::Topic;

use std::fmt::{self, Debug};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// A consumer's handle on a [`Topic`].
///
/// Values arrive in publish order. `None` from [`Subscriber::recv`] (or the
/// end of the [`Stream`]) means the stream is closed: the topic was closed or
/// this subscriber unsubscribed. Dropping the subscriber unsubscribes it.
pub struct Subscriber<T> {
    id: u64,
    topic: Topic<T>,
    receiver: mpsc::Receiver<T>,
    unsubscribed: bool,
}

impl<T> Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("topic", &self.topic.name())
            .field("unsubscribed", &self.unsubscribed)
            .finish()
    }
}

impl<T> Subscriber<T> {
    pub(crate) const fn new(id: u64, topic: Topic<T>, receiver: mpsc::Receiver<T>) -> Self {
        Self {
            id,
            topic,
            receiver,
            unsubscribed: false,
        }
    }

    /// Identifier, unique within the topic.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The topic this subscriber belongs to.
    #[must_use]
    pub const fn topic(&self) -> &Topic<T> {
        &self.topic
    }

    /// Waits for the next value. Returns `None` once the stream is closed.
    pub async fn recv(&mut self) -> Option<T> {
        if self.unsubscribed {
            return None;
        }
        self.receiver.recv().await
    }

    /// Leaves the topic. Calling it more than once has no further effect, and
    /// nothing is received after it returns.
    pub fn unsubscribe(&mut self) {
        if self.unsubscribed {
            return;
        }
        self.unsubscribed = true;
        self.topic.unsubscribe(self.id);

        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
    }
}

impl<T> Subscriber<T>
where
    T: Send + 'static,
{
    /// Feeds every value to `handler` until the stream closes or `cancel`
    /// fires.
    ///
    /// The end of the stream is a clean exit. The first error from `handler`
    /// stops the loop and is returned. The subscriber is unsubscribed on
    /// every exit path.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `handler`.
    pub async fn for_each<F, Fut, E>(
        mut self,
        cancel: &CancellationToken,
        mut handler: F,
    ) -> Result<(), E>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let result = loop {
            let value = tokio::select! {
                biased;
                () = cancel.cancelled() => break Ok(()),
                value = self.recv() => value,
            };

            match value {
                Some(value) => {
                    if let Err(e) = handler(value).await {
                        break Err(e);
                    }
                }
                None => break Ok(()),
            }
        };

        self.unsubscribe();
        result
    }

    /// Runs [`Subscriber::for_each`] on `tracker` and routes its error to
    /// `on_error` instead of returning it.
    pub fn for_each_async<F, Fut, E, H>(
        self,
        tracker: &TaskTracker,
        cancel: CancellationToken,
        handler: F,
        on_error: H,
    ) -> JoinHandle<()>
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Send + 'static,
        H: FnOnce(E) + Send + 'static,
    {
        tracker.spawn(async move {
            if let Err(e) = self.for_each(&cancel, handler).await {
                on_error(e);
            }
        })
    }
}

impl<T> Drop for Subscriber<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl<T> Stream for Subscriber<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        if self.unsubscribed {
            return Poll::Ready(None);
        }
        self.receiver.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use crate::Publisher;

    use std::sync::Arc;
    use std::time::Duration;

    use futures::StreamExt;
    use parking_lot::Mutex;
    use tokio::sync::oneshot;
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;
    use tokio_util::task::TaskTracker;

    #[derive(Debug, PartialEq, Eq)]
    struct Rejected(u32);

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let publisher = Publisher::<u32>::default();
        let topic = publisher.topic("numbers");
        let mut subscriber = topic.subscribe();

        topic.publish(1);
        subscriber.unsubscribe();
        subscriber.unsubscribe();

        assert_eq!(topic.subscriber_count(), 0);
        assert_eq!(topic.publish(2), 0);
        assert_eq!(subscriber.recv().await, None);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let publisher = Publisher::<u32>::default();
        let topic = publisher.topic("numbers");

        let subscriber = topic.subscribe();
        assert_eq!(topic.subscriber_count(), 1);

        drop(subscriber);
        assert_eq!(topic.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_for_each_ends_cleanly_on_close() {
        let publisher = Publisher::<u32>::new(8);
        let topic = publisher.topic("numbers");
        let subscriber = topic.subscribe();
        let seen = Arc::new(Mutex::new(Vec::new()));

        topic.publish(1);
        topic.publish(2);
        topic.close();

        let cancel = CancellationToken::new();
        let sink = seen.clone();
        let result: Result<(), Rejected> = subscriber
            .for_each(&cancel, |value| {
                sink.lock().push(value);
                async { Ok(()) }
            })
            .await;

        assert_eq!(result, Ok(()));
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_for_each_returns_handler_error() {
        let publisher = Publisher::<u32>::new(8);
        let topic = publisher.topic("numbers");
        let subscriber = topic.subscribe();

        topic.publish(1);
        topic.publish(13);
        topic.publish(2);

        let cancel = CancellationToken::new();
        let result = subscriber
            .for_each(&cancel, |value| async move {
                if value == 13 {
                    Err(Rejected(value))
                } else {
                    Ok(())
                }
            })
            .await;

        assert_eq!(result, Err(Rejected(13)));
        assert_eq!(topic.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_for_each_stops_on_cancel() {
        let publisher = Publisher::<u32>::default();
        let topic = publisher.topic("numbers");
        let subscriber = topic.subscribe();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<(), Rejected> = subscriber
            .for_each(&cancel, |_| async { Ok(()) })
            .await;

        assert_eq!(result, Ok(()));
        assert_eq!(topic.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_for_each_async_routes_errors() {
        let publisher = Publisher::<u32>::default();
        let topic = publisher.topic("numbers");
        let tracker = TaskTracker::new();
        let (error_tx, error_rx) = oneshot::channel();

        let handle = topic.subscribe().for_each_async(
            &tracker,
            CancellationToken::new(),
            |value| async move { Err::<(), _>(Rejected(value)) },
            move |e| {
                let _ = error_tx.send(e);
            },
        );

        topic.publish(5);

        assert_eq!(
            timeout(Duration::from_secs(1), error_rx).await.unwrap(),
            Ok(Rejected(5))
        );
        handle.await.unwrap();
        assert_eq!(topic.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_stream_ends_when_topic_closes() {
        let publisher = Publisher::<u32>::new(8);
        let topic = publisher.topic("numbers");
        let subscriber = topic.subscribe();

        topic.publish(1);
        topic.publish(2);
        topic.close();

        let values: Vec<u32> = subscriber.collect().await;
        assert_eq!(values, vec![1, 2]);
    }
}

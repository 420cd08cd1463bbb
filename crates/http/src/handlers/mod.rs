mod cleanup;
mod long_poll;
mod sessions;
mod sse;
mod ws;

pub(crate) use cleanup::cleanup_handler;
pub(crate) use long_poll::long_poll_handler;
pub(crate) use sessions::{
    create_session_handler, delete_message_handler, delete_session_handler, get_session_handler,
    insert_message_handler,
};
pub(crate) use sse::sse_handler;
pub(crate) use ws::ws_handler;

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tracing::info;

/// Logs when a streaming client connects and again when it goes away.
pub(crate) struct ConnectionLog {
    session_id: String,
    transport: &'static str,
}

impl ConnectionLog {
    pub(crate) fn new(session_id: &str, transport: &'static str) -> Self {
        info!(%session_id, transport, "client connected");
        Self {
            session_id: session_id.to_string(),
            transport,
        }
    }

    /// Ties this log to `stream`: the disconnect line is written when the
    /// stream is dropped.
    pub(crate) fn attach<S>(self, stream: S) -> LoggedStream<S::Item>
    where
        S: Stream + Send + 'static,
    {
        LoggedStream {
            stream: stream.boxed(),
            _log: self,
        }
    }
}

impl Drop for ConnectionLog {
    fn drop(&mut self) {
        info!(session_id = %self.session_id, transport = self.transport, "client disconnected");
    }
}

/// A stream that owns the [`ConnectionLog`] of the client it is sent to.
pub(crate) struct LoggedStream<T> {
    stream: BoxStream<'static, T>,
    _log: ConnectionLog,
}

impl<T> Stream for LoggedStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.stream.poll_next_unpin(cx)
    }
}

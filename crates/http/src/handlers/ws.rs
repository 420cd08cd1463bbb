use super::ConnectionLog;
use crate::context::HttpContext;
use crate::error::Error;

use std::time::Duration;

use airsync_events::{ClientEvent, Notification, SessionEvent, session_topic};
use airsync_pubsub::Subscriber;
use airsync_repository::SessionRepository;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::error;

pub(crate) async fn ws_handler<R>(
    Path(id): Path<String>,
    State(context): State<HttpContext<R>>,
    ws: WebSocketUpgrade,
) -> Result<Response, Error>
where
    R: SessionRepository,
{
    context.repository.find(&id).await?;

    let subscriber = context.publisher.topic(session_topic(&id)).subscribe();
    let heartbeat = context.options.heartbeat;
    let shutdown_token = context.shutdown_token.clone();

    Ok(ws
        .on_upgrade(move |socket| async move {
            let _log = ConnectionLog::new(&id, "websocket");
            if let Err(e) = handle_socket(socket, subscriber, heartbeat, shutdown_token).await {
                error!(session_id = %id, "websocket error: {e}");
            }
        })
        .into_response())
}

pub(crate) fn text_frame(event: &SessionEvent) -> Result<Message, Error> {
    let json = serde_json::to_string(&ClientEvent::try_from(event)?)?;
    Ok(Message::Text(json.into()))
}

async fn handle_socket(
    socket: WebSocket,
    mut subscriber: Subscriber<Notification>,
    heartbeat: Duration,
    shutdown_token: CancellationToken,
) -> Result<(), Error> {
    let (mut sender, mut receiver) = socket.split();

    let result = loop {
        tokio::select! {
            () = shutdown_token.cancelled() => break Ok(()),
            notification = subscriber.recv() => match notification {
                Some(Notification::Event(event)) => {
                    if let Err(e) = sender.send(text_frame(&event)?).await {
                        break Err(e.into());
                    }
                }
                Some(Notification::Payload(_)) => {}
                None => break Ok(()),
            },
            message = receiver.next() => match message {
                Some(Ok(Message::Close(_))) | None => break Ok(()),
                // Pings are answered by the protocol layer.
                Some(Ok(_)) => {}
                Some(Err(e)) => break Err(e.into()),
            },
            () = tokio::time::sleep(heartbeat) => {
                if let Err(e) = sender.send(Message::Ping(Bytes::new())).await {
                    break Err(e.into());
                }
            }
        }
    };

    subscriber.unsubscribe();
    sender.send(Message::Close(None)).await.ok();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_frame_carries_client_event() {
        let event = SessionEvent::session_deleted("a");

        let Message::Text(text) = text_frame(&event).unwrap() else {
            panic!("expected a text frame");
        };

        let client: ClientEvent = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(client.event, "session.deleted");
        assert_eq!(client.data, serde_json::json!("a"));
    }
}

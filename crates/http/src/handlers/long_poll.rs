use super::ConnectionLog;
use crate::context::HttpContext;
use crate::error::Error;
use crate::response::RestResponse;

use airsync_events::{ClientEvent, Notification, SessionEvent, session_topic};
use airsync_pubsub::Subscriber;
use airsync_repository::SessionRepository;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub(crate) async fn long_poll_handler<R>(
    Path(id): Path<String>,
    State(context): State<HttpContext<R>>,
) -> Result<Response, Error>
where
    R: SessionRepository,
{
    context.repository.find(&id).await?;

    let mut subscriber = context.publisher.topic(session_topic(&id)).subscribe();
    let _log = ConnectionLog::new(&id, "long-poll");

    let event = tokio::select! {
        event = next_event(&mut subscriber) => event,
        () = tokio::time::sleep(context.options.poll_timeout) => None,
        () = context.shutdown_token.cancelled() => None,
    };
    subscriber.unsubscribe();

    let Some(event) = event else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let data = serde_json::to_value(ClientEvent::try_from(&event)?)?;
    Ok(RestResponse::success("New session event", Some(data)).into_response())
}

async fn next_event(subscriber: &mut Subscriber<Notification>) -> Option<SessionEvent> {
    loop {
        match subscriber.recv().await? {
            Notification::Event(event) => return Some(event),
            Notification::Payload(_) => {}
        }
    }
}

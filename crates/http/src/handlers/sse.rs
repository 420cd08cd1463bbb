use super::ConnectionLog;
use crate::context::HttpContext;
use crate::error::Error;

use std::convert::Infallible;

use airsync_events::{ClientEvent, Notification, session_topic};
use airsync_repository::SessionRepository;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt, future, stream};
use tracing::warn;
use uuid::Uuid;

pub(crate) async fn sse_handler<R>(
    Path(id): Path<String>,
    State(context): State<HttpContext<R>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Error>
where
    R: SessionRepository,
{
    context.repository.find(&id).await?;

    let subscriber = context.publisher.topic(session_topic(&id)).subscribe();
    let log = ConnectionLog::new(&id, "sse");

    let ping = stream::once(future::ready(Ok::<_, Infallible>(event("ping").data(""))));
    let messages = subscriber
        .take_until(context.shutdown_token.clone().cancelled_owned())
        .filter_map(|notification| {
            let Notification::Event(session_event) = notification else {
                return future::ready(None);
            };

            let frame = ClientEvent::try_from(&session_event)
                .map_err(Error::from)
                .and_then(|client| event("message").json_data(client).map_err(Error::from));

            future::ready(match frame {
                Ok(frame) => Some(Ok::<_, Infallible>(frame)),
                Err(e) => {
                    warn!(session_id = %session_event.session_id, "dropping sse event: {e}");
                    None
                }
            })
        });

    Ok(Sse::new(log.attach(ping.chain(messages)))
        .keep_alive(KeepAlive::new().interval(context.options.heartbeat)))
}

fn event(name: &str) -> Event {
    Event::default().id(Uuid::new_v4().to_string()).event(name)
}

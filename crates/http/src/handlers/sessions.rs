use crate::context::HttpContext;
use crate::error::Error;
use crate::response::RestResponse;

use airsync_events::{NewMessage, Session, SessionEvent};
use airsync_repository::SessionRepository;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde_json::json;
use tracing::info;

pub(crate) async fn create_session_handler<R>(
    State(context): State<HttpContext<R>>,
) -> Result<RestResponse, Error>
where
    R: SessionRepository,
{
    let session = context.repository.create().await?;
    let id = session.id.clone();

    context.publish(SessionEvent::session_created(session));
    info!(session_id = %id, "created session");

    Ok(RestResponse::success("Session created", Some(json!(id))))
}

pub(crate) async fn get_session_handler<R>(
    Path(id): Path<String>,
    State(context): State<HttpContext<R>>,
) -> Result<Json<Session>, Error>
where
    R: SessionRepository,
{
    Ok(Json(context.repository.find(&id).await?))
}

pub(crate) async fn delete_session_handler<R>(
    Path(id): Path<String>,
    State(context): State<HttpContext<R>>,
) -> Result<RestResponse, Error>
where
    R: SessionRepository,
{
    context.repository.delete(&id).await?;

    context.publish(SessionEvent::session_deleted(&id));
    info!(session_id = %id, "deleted session");

    Ok(RestResponse::success("Session deleted", None))
}

pub(crate) async fn insert_message_handler<R>(
    Path(id): Path<String>,
    State(context): State<HttpContext<R>>,
    body: Result<Json<NewMessage>, JsonRejection>,
) -> Result<RestResponse, Error>
where
    R: SessionRepository,
{
    let Json(message) = body?;
    let message = context.repository.insert_message(&id, message).await?;
    let message_id = message.id.clone();

    context.publish(SessionEvent::message_inserted(&id, message));
    info!(session_id = %id, %message_id, "inserted message");

    Ok(RestResponse::success("Message inserted", Some(json!(message_id))))
}

pub(crate) async fn delete_message_handler<R>(
    Path((id, message_id)): Path<(String, String)>,
    State(context): State<HttpContext<R>>,
) -> Result<RestResponse, Error>
where
    R: SessionRepository,
{
    context.repository.delete_message(&id, &message_id).await?;

    context.publish(SessionEvent::message_deleted(&id, &message_id));
    info!(session_id = %id, %message_id, "deleted message");

    Ok(RestResponse::success("Message deleted", None))
}

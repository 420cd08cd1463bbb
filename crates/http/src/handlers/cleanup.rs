use crate::context::HttpContext;
use crate::error::Error;
use crate::response::RestResponse;

use airsync_repository::SessionRepository;
use axum::extract::State;
use serde_json::json;

pub(crate) async fn cleanup_handler<R>(
    State(context): State<HttpContext<R>>,
) -> Result<RestResponse, Error>
where
    R: SessionRepository,
{
    let deleted = context.cleanup.run().await?;

    Ok(RestResponse::success(
        "Cleanup completed",
        Some(json!({ "deleted": deleted })),
    ))
}

//! HTTP surface: REST endpoints for sessions and messages, the WebSocket,
//! SSE and long-poll streaming adapters, and the cleanup endpoint.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod cleanup;
mod context;
mod error;
mod handlers;
mod response;
mod server;

pub use cleanup::{CleanupOptions, CleanupService};
pub use context::{DEFAULT_HEARTBEAT, DEFAULT_POLL_TIMEOUT, HttpContext, HttpOptions};
pub use error::Error;
pub use response::RestResponse;
pub use server::HttpServer;

use handlers::{
    cleanup_handler, create_session_handler, delete_message_handler, delete_session_handler,
    get_session_handler, insert_message_handler, long_poll_handler, sse_handler, ws_handler,
};

use airsync_repository::SessionRepository;
use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;

/// Builds the application router.
pub fn router<R>(context: HttpContext<R>) -> Router
where
    R: SessionRepository,
{
    let enable_cors = context.options.enable_cors;

    let router = Router::new()
        // ** Sessions **
        .route("/sessions", post(create_session_handler::<R>))
        .route(
            "/sessions/{id}",
            get(get_session_handler::<R>)
                .delete(delete_session_handler::<R>)
                .put(insert_message_handler::<R>),
        )
        .route(
            "/sessions/{id}/{message_id}",
            delete(delete_message_handler::<R>),
        )
        // ** Streaming **
        .route("/ws/sessions/{id}", get(ws_handler::<R>))
        .route("/sse/sessions/{id}", get(sse_handler::<R>))
        .route("/lp/sessions/{id}", get(long_poll_handler::<R>))
        // ** Maintenance **
        .route(
            "/cron/cleanup",
            get(cleanup_handler::<R>).post(cleanup_handler::<R>),
        )
        .with_state(context);

    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

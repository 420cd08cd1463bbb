use crate::response::RestResponse;

use airsync_bootable::BootableError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The server has already been started.
    #[error("the server has already been started")]
    AlreadyStarted,

    /// Failed to bind to address.
    #[error("failed to bind to address: {0}")]
    Bind(#[source] std::io::Error),

    /// Cleanup was requested before the next allowed run.
    #[error("no cleanup job run until {}", .next_run.to_rfc3339_opts(SecondsFormat::Secs, true))]
    CleanupTooEarly {
        /// Earliest time the next run is allowed.
        next_run: DateTime<Utc>,
    },

    /// An event could not be shaped for clients.
    #[error(transparent)]
    Event(#[from] airsync_events::Error),

    /// The request body is not valid JSON for the endpoint.
    #[error(transparent)]
    MalformedBody(#[from] JsonRejection),

    /// The repository rejected the operation.
    #[error(transparent)]
    Repository(#[from] airsync_repository::Error),

    /// JSON serialization failed.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    /// A WebSocket or SSE frame could not be sent.
    #[error(transparent)]
    Axum(#[from] axum::Error),
}

impl Error {
    const fn status_code(&self) -> StatusCode {
        match self {
            Self::Repository(
                airsync_repository::Error::SessionNotFound(_)
                | airsync_repository::Error::MessageNotFound(_),
            ) => StatusCode::NOT_FOUND,
            Self::Repository(airsync_repository::Error::EmptyMessage) | Self::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::CleanupTooEarly { .. } => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let message = if status_code.is_server_error() {
            error!("request failed: {self}");
            "Internal server error"
        } else {
            "Invalid request error"
        };

        RestResponse::error(status_code, message, self.to_string()).into_response()
    }
}

impl BootableError for Error {}

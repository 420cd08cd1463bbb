use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// JSON envelope returned by the REST endpoints.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RestResponse {
    /// `success` or `error`.
    pub status: String,

    /// Human readable summary.
    pub message: String,

    /// Endpoint specific result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Error detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip)]
    status_code: StatusCode,
}

impl RestResponse {
    /// A 200 response.
    #[must_use]
    pub fn success(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
            error: None,
            status_code: StatusCode::OK,
        }
    }

    /// An error response with the given status.
    #[must_use]
    pub fn error(
        status_code: StatusCode,
        message: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
            error: Some(error.into()),
            status_code,
        }
    }

    /// HTTP status the response is sent with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.status_code
    }
}

impl IntoResponse for RestResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

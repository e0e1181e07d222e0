//! Response envelope shared by the JSON routes.
//!
//! ```text
//! success  {"success": true,  ...payload}
//! failure  {"success": false, "error": "<code>", "message": "<text>"}
//! ```

use crate::error::{Error, ErrorKind};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};

/// HTTP status for an error class.
#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::UpstreamError | ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log an error at the boundary: server-side failures with full detail,
/// client mistakes quietly.
pub(crate) fn log_failure(route: &str, err: &Error) {
    if err.kind().is_client_facing() {
        debug!("{route} refused: {err}");
    } else {
        error!("{route} failed: {err}");
    }
}

/// Successful JSON response.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    success: bool,
    #[serde(flatten)]
    data: T,
}

impl<T> ApiSuccess<T> {
    /// Wrap a payload.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Failed JSON response.
#[derive(Debug)]
pub struct ApiError {
    route: &'static str,
    error: Error,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
}

impl ApiError {
    /// Attach the route an error surfaced on.
    #[must_use]
    pub fn new(route: &'static str, error: Error) -> Self {
        Self { route, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log_failure(self.route, &self.error);
        let kind = self.error.kind();
        let body = ErrorBody {
            success: false,
            error: kind.code(),
            message: self.error.public_message(),
        };
        (status_for(kind), Json(body)).into_response()
    }
}

/// Failed `/download`, rendered as plain text.
#[derive(Debug)]
pub struct PlainError(pub Error);

impl IntoResponse for PlainError {
    fn into_response(self) -> Response {
        log_failure("download", &self.0);
        (status_for(self.0.kind()), self.0.public_message()).into_response()
    }
}

use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;

use crate::domain::error::TodoError;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody { pub message: String }

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { message: self.message })).into_response()
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::InvalidInput(message) => Self::bad_request(message),
            TodoError::NotFound(_) => Self { status: StatusCode::NOT_FOUND, message: "todo not found".into() },
            TodoError::Backend(e) => {
                tracing::error!(error = %format!("{e:#}"), "storage backend failure");
                Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: "internal server error".into() }
            }
        }
    }
}

/// Bad or missing JSON is a client error, including a wrong content type on create.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => Self::bad_request("Content-Type must be application/json"),
            other => Self::bad_request(other.body_text()),
        }
    }
}

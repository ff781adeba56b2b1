//! Gateway-wide error type.
//!
//! Maps every failure this crate can produce onto an HTTP status: bad
//! input (400), a resource that isn't there or couldn't be opened (404
//! or 500), or an allocation refused on purpose (503). A [`GatewayError`]
//! raised *after* response headers have already been committed is never
//! turned into an `IntoResponse` — see `stream::entry_pump`/
//! `stream::field_pump`, which instead log it and end the body early.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use journal_core::JournalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("out of memory")]
    OutOfMemory,
}

impl From<JournalError> for GatewayError {
    fn from(e: JournalError) -> Self {
        match e {
            JournalError::CursorNotFound => {
                GatewayError::BadRequest("cursor does not match any entry".to_owned())
            }
            other => GatewayError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            GatewayError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            GatewayError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            GatewayError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            GatewayError::OutOfMemory => (StatusCode::SERVICE_UNAVAILABLE, "Out of memory.".to_owned()),
        };
        (status, format!("{body}\n")).into_response()
    }
}

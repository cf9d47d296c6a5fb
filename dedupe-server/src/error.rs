//! Maps `DedupeError` to HTTP status codes and a small JSON error body —
//! mirrors `sem_os_server::error::AppError` exactly: a newtype wrapper,
//! `From` to adopt the domain error, `IntoResponse` to pick a status and
//! serialize `{"detail": ...}` (§6: "500 on any unhandled fault with
//! `{detail: <string>}`").

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use dedupe_core::error::DedupeError;
use serde_json::json;

pub struct AppError(DedupeError);

impl From<DedupeError> for AppError {
    fn from(e: DedupeError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = json!({ "detail": self.0.to_string() });

        (status, Json(body)).into_response()
    }
}

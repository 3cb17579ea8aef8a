//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure a handler can hit becomes an inline JSON message with
//! an appropriate status code; nothing here ever terminates the
//! process.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The uploaded CSV was rejected before any database write
  /// (missing columns or a field that failed coercion).
  #[error("bad upload: {0}")]
  BadUpload(String),

  /// Bad analytics parameters (e.g. an unknown column name).
  #[error("bad request: {0}")]
  BadRequest(String),

  /// The completion was not SQL, or the gate rejected it. Never
  /// executed.
  #[error("rejected: {0}")]
  Rejected(String),

  /// The completion service could not be reached or misbehaved.
  #[error("completion service failed: {0}")]
  Completion(String),

  /// The ingestion batch failed even after its retry.
  #[error("ingestion failed: {0}")]
  IngestionFailed(String),

  /// The database rejected a gate-approved statement. The message is
  /// passed through verbatim so the user can rephrase.
  #[error("sql execution failed: {0}")]
  SqlExecution(String),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::BadUpload(_) | ApiError::BadRequest(_) => {
        StatusCode::BAD_REQUEST
      }
      ApiError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Completion(_) | ApiError::IngestionFailed(_) => {
        StatusCode::BAD_GATEWAY
      }
      ApiError::SqlExecution(_) => StatusCode::BAD_REQUEST,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    tracing::warn!(%status, error = %self, "request failed");
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

impl From<fraudlens_bridge::Error> for ApiError {
  fn from(e: fraudlens_bridge::Error) -> Self {
    use fraudlens_bridge::Error as Bridge;
    match e {
      Bridge::Http(_) | Bridge::Completion(_) => {
        ApiError::Completion(e.to_string())
      }
      Bridge::NotASqlStatement(_) | Bridge::Rejected(_) => {
        ApiError::Rejected(e.to_string())
      }
    }
  }
}

//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use recoup_core::{
  reconcile::IngestError,
  store::StoreError,
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  /// A uniqueness constraint raced; the caller may retry the request.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a reconciler failure onto HTTP semantics: input problems are the
  /// client's fault (400), a lost uniqueness race is a retryable conflict
  /// (409), anything else is ours (500).
  pub fn from_ingest<E: StoreError>(e: IngestError<E>) -> Self {
    match e {
      IngestError::Store(inner) if inner.is_constraint_violation() => {
        ApiError::Conflict(inner.to_string())
      }
      IngestError::Store(inner) => ApiError::Store(Box::new(inner)),
      validation => ApiError::BadRequest(validation.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

//! Failures surfaced to HTTP callers as `500 {"error": ...}`

use axum::{
  http::StatusCode,
  response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::server::types::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Failed to embed query: {0}")]
  Embedding(anyhow::Error),

  #[error("Vector store query failed: {0}")]
  VectorStore(anyhow::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    tracing::error!("{self:#}");

    let body = ErrorResponse { error: self.to_string() };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
  }
}

//! Root, status and version endpoint handlers

use axum::{extract::State, response::Json};

use crate::server::models::Topic;
use crate::server::state::SharedContext;
use crate::server::types::{MessageResponse, StatusResponse, VersionResponse};

pub const WELCOME_MESSAGE: &str = "Welcome to the Review Search API!";

/// GET / - Welcome message
pub async fn root() -> Json<MessageResponse> {
  Json(MessageResponse { message: WELCOME_MESSAGE.to_string() })
}

/// GET /status - Health check endpoint
pub async fn status(State(context): State<SharedContext>) -> Json<StatusResponse> {
  Json(StatusResponse {
    status: "healthy".to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
    reviews: context.corpus.len(),
    topics: Topic::names().into_iter().map(str::to_string).collect(),
    embedding_model: context.embedder.model_name().to_string(),
    embedding_dimension: context.corpus.dimension(),
  })
}

/// GET /version - Returns current API version
pub async fn version() -> Json<VersionResponse> {
  Json(VersionResponse { version: env!("CARGO_PKG_VERSION").to_string() })
}

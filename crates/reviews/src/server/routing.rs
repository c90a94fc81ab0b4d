//! Axum router configuration for all endpoints

use axum::{
  middleware,
  routing::{get, post},
  Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::server::handlers::{search, status};
use crate::server::middleware::request_context_middleware;
use crate::server::state::SharedContext;

/// Create the main application router
pub fn create_router(context: SharedContext) -> Router {
  Router::new()
    .route("/", get(status::root))
    // Status and version endpoints
    .route("/status", get(status::status))
    .route("/version", get(status::version))
    // Search endpoints
    .route("/search_by_text", post(search::search_by_text))
    .route("/search_by_topic", get(search::search_by_topic))
    .layer(middleware::from_fn(request_context_middleware))
    .with_state(context)
}

/// The router wrapped in HTTP tracing and an open CORS policy
pub fn create_app(context: SharedContext) -> Router {
  create_router(context).layer(
    ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::very_permissive()),
  )
}

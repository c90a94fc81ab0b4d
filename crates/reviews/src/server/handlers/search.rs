//! Search endpoint handlers

use axum::{
  extract::{Query, State},
  response::Json,
  Extension,
};

use crate::server::error::ApiError;
use crate::server::middleware::RequestContext;
use crate::server::services::search;
use crate::server::state::SharedContext;
use crate::server::types::{
  ErrorResponse, TextSearchRequest, TextSearchResponse, TopicSearchOutcome, TopicSearchParams,
  TopicSearchResponse,
};

/// POST /search_by_text - Nearest reviews to a free-text query
pub async fn search_by_text(
  State(context): State<SharedContext>,
  Extension(request): Extension<RequestContext>,
  Json(body): Json<TextSearchRequest>,
) -> Result<Json<TextSearchResponse>, ApiError> {
  let top_n = body.top_n();
  tracing::debug!(request_id = %request.request_id, top_n, "Text search: {:?}", body.query);

  let results = search::search_by_text(&context, &body.query, top_n).await?;

  Ok(Json(TextSearchResponse { query: body.query, results }))
}

/// GET /search_by_topic - Reviews ranked by similarity to a fixed topic
///
/// An unknown topic is answered with 200 and an `error` body.
pub async fn search_by_topic(
  State(context): State<SharedContext>,
  Query(params): Query<TopicSearchParams>,
) -> Json<TopicSearchOutcome> {
  match search::search_by_topic(&context.corpus, &params.topic, params.top_n) {
    Ok(top_reviews) => Json(TopicSearchOutcome::Ranked(TopicSearchResponse {
      topic: params.topic,
      top_reviews,
    })),
    Err(invalid) => {
      tracing::info!("Rejected topic {:?}", invalid.0);
      Json(TopicSearchOutcome::Invalid(ErrorResponse { error: invalid.to_string() }))
    }
  }
}

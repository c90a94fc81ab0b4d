//! REST API request and response bodies

use serde::{Deserialize, Serialize};

/// Result count for text search when the request omits `top_n`
pub const DEFAULT_TEXT_TOP_N: i64 = 3;

/// Result count for topic search when the request omits `top_n`
pub const DEFAULT_TOPIC_TOP_N: i64 = 5;

fn default_topic_top_n() -> i64 {
  DEFAULT_TOPIC_TOP_N
}

// Root Endpoint
// =============

/// Response for `/`
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
  pub message: String,
}

// Status/Version Endpoints
// =======================

/// Response for `/status`
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
  /// Always `healthy` once the server is accepting requests
  pub status: String,

  /// Crate version
  pub version: String,

  /// Number of reviews loaded at startup
  pub reviews: usize,

  /// Valid topic names, in score-column order
  pub topics: Vec<String>,

  /// Embedding model identifier
  pub embedding_model: String,

  /// Width of every stored embedding
  pub embedding_dimension: usize,
}

/// Response for `/version`
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
  /// Current API version
  pub version: String,
}

// Search Endpoints
// ================

/// Request body for `POST /search_by_text`
#[derive(Debug, Serialize, Deserialize)]
pub struct TextSearchRequest {
  /// Free-text query
  pub query: String,

  /// Number of results; defaults to 3, clamped to the corpus size
  #[serde(default)]
  pub top_n: Option<i64>,
}

impl TextSearchRequest {
  pub fn top_n(&self) -> i64 {
    self.top_n.unwrap_or(DEFAULT_TEXT_TOP_N)
  }
}

/// One nearest-neighbour hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSearchResult {
  pub review: String,
  pub class_name: String,
}

/// Response for `POST /search_by_text`
#[derive(Debug, Serialize, Deserialize)]
pub struct TextSearchResponse {
  pub query: String,
  pub results: Vec<TextSearchResult>,
}

/// Query string for `GET /search_by_topic`
#[derive(Debug, Serialize, Deserialize)]
pub struct TopicSearchParams {
  pub topic: String,

  #[serde(default = "default_topic_top_n")]
  pub top_n: i64,
}

/// One ranked review for a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicReview {
  pub class_name: String,
  pub review: String,
}

/// Successful response for `GET /search_by_topic`
#[derive(Debug, Serialize, Deserialize)]
pub struct TopicSearchResponse {
  pub topic: String,
  pub top_reviews: Vec<TopicReview>,
}

/// Error body, used both for inline validation failures and 500s
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
  pub error: String,
}

/// `GET /search_by_topic` answers 200 either way; the body shape tells the outcomes apart
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TopicSearchOutcome {
  Ranked(TopicSearchResponse),
  Invalid(ErrorResponse),
}

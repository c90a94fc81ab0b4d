//! The two read operations: nearest-neighbour text search and topic ranking

use crate::server::error::ApiError;
use crate::server::models::review::{CLASS_NAME_KEY, UNKNOWN_CLASS};
use crate::server::models::{ReviewCorpus, Topic, UnknownTopic};
use crate::server::services::embeddings::embed_query;
use crate::server::state::AppContext;
use crate::server::types::{TextSearchResult, TopicReview};

/// Clamp a caller-supplied result count to `[0, available]`
pub fn clamp_top_n(requested: i64, available: usize) -> usize {
  if requested <= 0 {
    return 0;
  }
  usize::try_from(requested).map_or(available, |n| n.min(available))
}

/// Reviews nearest to `query` in embedding space, nearest first
pub async fn search_by_text(
  context: &AppContext,
  query: &str,
  top_n: i64,
) -> Result<Vec<TextSearchResult>, ApiError> {
  let top_n = clamp_top_n(top_n, context.corpus.len());
  if top_n == 0 {
    return Ok(Vec::new());
  }

  let embedding =
    embed_query(context.embedder.clone(), query.to_string()).await.map_err(ApiError::Embedding)?;

  let hits = context.store.query(&embedding, top_n).await.map_err(ApiError::VectorStore)?;
  tracing::debug!("Text search returned {} of {} requested", hits.len(), top_n);

  let results = hits
    .into_iter()
    .map(|hit| TextSearchResult {
      class_name: hit
        .metadata
        .get(CLASS_NAME_KEY)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_CLASS.to_string()),
      review: hit.document,
    })
    .collect();

  Ok(results)
}

/// The `top_n` reviews scoring highest against the named topic
pub fn search_by_topic(
  corpus: &ReviewCorpus,
  topic: &str,
  top_n: i64,
) -> Result<Vec<TopicReview>, UnknownTopic> {
  let topic: Topic = topic.parse()?;
  let top_n = clamp_top_n(top_n, corpus.len());

  let ranked = corpus
    .rank_by_topic(topic, top_n)
    .into_iter()
    .map(|review| TopicReview {
      class_name: review.class_name_or_unknown().to_string(),
      review: review.text.clone(),
    })
    .collect();

  Ok(ranked)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dataset::ReviewRow;

  fn corpus() -> ReviewCorpus {
    let topics: Vec<Vec<f32>> = (0..Topic::COUNT)
      .map(|axis| (0..Topic::COUNT).map(|i| if i == axis { 1.0 } else { 0.0 }).collect())
      .collect();

    let rows = vec![
      ReviewRow { text: "soft".into(), class_name: Some("Knits".into()) },
      ReviewRow { text: "cheap".into(), class_name: None },
      ReviewRow { text: "sturdy".into(), class_name: Some("Jackets".into()) },
    ];
    let embeddings = vec![
      vec![0.0, 0.0, 0.0, 1.0, 0.0],
      vec![0.3, 0.0, 0.0, 0.0, 1.0],
      vec![1.0, 0.0, 0.0, 0.0, 0.2],
    ];

    ReviewCorpus::build(rows, embeddings, topics).unwrap()
  }

  #[test]
  fn test_clamp_top_n() {
    assert_eq!(clamp_top_n(3, 10), 3);
    assert_eq!(clamp_top_n(0, 10), 0);
    assert_eq!(clamp_top_n(-4, 10), 0);
    assert_eq!(clamp_top_n(50, 10), 10);
    assert_eq!(clamp_top_n(i64::MAX, 10), 10);
    assert_eq!(clamp_top_n(3, 0), 0);
  }

  #[test]
  fn test_search_by_topic_ranks_and_labels() {
    let results = search_by_topic(&corpus(), "price", 2).unwrap();

    assert_eq!(
      results,
      vec![
        TopicReview { class_name: UNKNOWN_CLASS.into(), review: "cheap".into() },
        TopicReview { class_name: "Jackets".into(), review: "sturdy".into() },
      ]
    );
  }

  #[test]
  fn test_search_by_topic_bounds() {
    let corpus = corpus();
    assert!(search_by_topic(&corpus, "quality", 0).unwrap().is_empty());
    assert!(search_by_topic(&corpus, "quality", -1).unwrap().is_empty());
    assert_eq!(search_by_topic(&corpus, "quality", 99).unwrap().len(), 3);
  }

  #[test]
  fn test_search_by_topic_rejects_unknown_names() {
    let err = search_by_topic(&corpus(), "durability", 5).unwrap_err();
    assert_eq!(err, UnknownTopic("durability".into()));
  }
}

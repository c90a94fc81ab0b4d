mod common;

use anyhow::Result;
use std::sync::Arc;

use reviews::server::models::Topic;
use reviews::server::services::embeddings::Embedder;
use reviews::server::services::memory_store::DEFAULT_MAX_BATCH_SIZE;
use reviews::server::services::search::{search_by_text, search_by_topic};
use reviews::server::services::vector_database::DistanceMetric;
use reviews::server::startup::{build_context, ServiceConfig};
use reviews::server::state::AppContext;

use common::{
  context_for, context_with, write_dataset, FailingEmbedder, VocabularyEmbedder, REVIEWS_CSV,
  REVIEW_TEXTS, VOCABULARY_DIM,
};

fn ranked_texts(context: &AppContext, topic: Topic, top_n: usize) -> Vec<&str> {
  context.corpus.rank_by_topic(topic, top_n).iter().map(|review| review.text.as_str()).collect()
}

#[tokio::test]
async fn test_context_holds_every_retained_review() -> Result<()> {
  let context = context_for(REVIEWS_CSV).await?;

  assert_eq!(context.corpus.len(), REVIEW_TEXTS.len());
  assert_eq!(context.corpus.dimension(), VOCABULARY_DIM);
  assert_eq!(context.store.count().await?, REVIEW_TEXTS.len());
  assert_eq!(context.store.name(), "reviews");

  for (index, review) in context.corpus.reviews().iter().enumerate() {
    assert_eq!(review.index, index);
    assert_eq!(review.id, format!("review_{index}"));
    assert_eq!(review.text, REVIEW_TEXTS[index]);
  }
  Ok(())
}

#[tokio::test]
async fn test_topic_scores_are_cosines_in_range() -> Result<()> {
  let context = context_for(REVIEWS_CSV).await?;

  for review in context.corpus.reviews() {
    for topic in Topic::ALL {
      let score = review.score(topic);
      assert!((-1.0..=1.0).contains(&score), "{score} out of range");
    }
  }

  // "Great price for the quality": five distinct words, one of them the topic
  let review = context.corpus.get(5).unwrap();
  assert!((review.score(Topic::Quality) - 1.0 / 5.0_f32.sqrt()).abs() < 1e-6);
  assert_eq!(review.score(Topic::Comfort), 0.0);
  Ok(())
}

#[tokio::test]
async fn test_topic_rankings() -> Result<()> {
  let context = context_for(REVIEWS_CSV).await?;

  assert_eq!(ranked_texts(&context, Topic::Quality, 2), vec![REVIEW_TEXTS[5], REVIEW_TEXTS[2]]);
  assert_eq!(ranked_texts(&context, Topic::Price, 2), vec![REVIEW_TEXTS[5], REVIEW_TEXTS[2]]);
  assert_eq!(ranked_texts(&context, Topic::Fit, 2), vec![REVIEW_TEXTS[6], REVIEW_TEXTS[3]]);
  assert_eq!(ranked_texts(&context, Topic::Size, 2), vec![REVIEW_TEXTS[6], REVIEW_TEXTS[3]]);
  assert_eq!(ranked_texts(&context, Topic::Comfort, 1), vec![REVIEW_TEXTS[4]]);
  Ok(())
}

#[tokio::test]
async fn test_unscored_reviews_follow_in_load_order() -> Result<()> {
  let context = context_for(REVIEWS_CSV).await?;

  let indices: Vec<usize> =
    context.corpus.rank_by_topic(Topic::Comfort, 7).iter().map(|review| review.index).collect();
  assert_eq!(indices, vec![4, 0, 1, 2, 3, 5, 6]);
  Ok(())
}

#[tokio::test]
async fn test_text_search_self_match_ranks_first() -> Result<()> {
  let context = context_for(REVIEWS_CSV).await?;

  for text in REVIEW_TEXTS {
    let results = search_by_text(&context, text, 3).await?;
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].review, text);
  }
  Ok(())
}

#[tokio::test]
async fn test_text_search_labels() -> Result<()> {
  let context = context_for(REVIEWS_CSV).await?;

  let results = search_by_text(&context, "Great price for the quality", 1).await?;
  assert_eq!(results[0].class_name, "Unknown");

  let results = search_by_text(&context, "Runs small, order a size up for a better fit", 1).await?;
  assert_eq!(results[0].class_name, "Pants");
  Ok(())
}

#[tokio::test]
async fn test_search_bounds() -> Result<()> {
  let context = context_for(REVIEWS_CSV).await?;

  assert!(search_by_text(&context, "fit", 0).await?.is_empty());
  assert!(search_by_text(&context, "fit", -3).await?.is_empty());
  assert_eq!(search_by_text(&context, "fit", 100).await?.len(), REVIEW_TEXTS.len());

  assert_eq!(search_by_topic(&context.corpus, "fit", 100).unwrap().len(), REVIEW_TEXTS.len());
  assert!(search_by_topic(&context.corpus, "fit", -1).unwrap().is_empty());
  Ok(())
}

#[tokio::test]
async fn test_small_insert_batches_store_everything() -> Result<()> {
  let (_dir, path) = write_dataset(REVIEWS_CSV)?;
  let mut config = ServiceConfig::new(path);
  config.insert_batch_size = 2;
  config.metric = DistanceMetric::Cosine;

  let context = build_context(&config, Arc::new(VocabularyEmbedder::default())).await?;
  assert_eq!(context.store.max_batch_size(), DEFAULT_MAX_BATCH_SIZE);
  assert_eq!(context.store.count().await?, REVIEW_TEXTS.len());

  let results = search_by_text(&context, REVIEW_TEXTS[6], 1).await?;
  assert_eq!(results[0].review, REVIEW_TEXTS[6]);
  Ok(())
}

#[tokio::test]
async fn test_store_ids_match_corpus_ids() -> Result<()> {
  let context = context_for(REVIEWS_CSV).await?;

  for review in context.corpus.reviews() {
    let nearest = context.store.query(&review.embedding, 1).await?;
    assert_eq!(nearest[0].id, review.id);
    assert_eq!(nearest[0].document, review.text);
  }
  Ok(())
}

#[tokio::test]
async fn test_oversized_insert_batch_is_capped_by_store() -> Result<()> {
  let rows = DEFAULT_MAX_BATCH_SIZE + 1;
  let mut csv = String::from("Review Text,Class Name\n");
  for i in 0..rows {
    csv.push_str(&format!("review {i},Knits\n"));
  }

  let (_dir, path) = write_dataset(&csv)?;
  let mut config = ServiceConfig::new(path);
  config.insert_batch_size = 10_000;

  let context = build_context(&config, Arc::new(VocabularyEmbedder::default())).await?;
  assert_eq!(context.store.max_batch_size(), DEFAULT_MAX_BATCH_SIZE);
  assert_eq!(context.store.count().await?, rows);
  assert_eq!(context.corpus.len(), rows);
  Ok(())
}

#[tokio::test]
async fn test_empty_dataset_starts_and_returns_nothing() -> Result<()> {
  let context = context_for("Review Text,Class Name\n,Knits\n").await?;

  assert!(context.corpus.is_empty());
  assert_eq!(context.store.count().await?, 0);
  assert!(search_by_text(&context, "fit", 3).await?.is_empty());
  assert!(search_by_topic(&context.corpus, "fit", 5).unwrap().is_empty());
  Ok(())
}

#[tokio::test]
async fn test_startup_fails_without_dataset() {
  let dir = tempfile::TempDir::new().unwrap();
  let config = ServiceConfig::new(dir.path().join("Data.csv"));

  let err = build_context(&config, Arc::new(VocabularyEmbedder::default())).await.err().unwrap();
  assert!(format!("{err:#}").contains("Failed to load dataset"));
}

#[tokio::test]
async fn test_startup_fails_when_encoder_fails() {
  let embedder: Arc<dyn Embedder> = Arc::new(FailingEmbedder);
  let err = context_with(REVIEWS_CSV, embedder).await.err().unwrap();
  assert!(format!("{err:#}").contains("encoder offline"));
}

#[tokio::test]
async fn test_startup_fails_on_missing_column() {
  let err = context_for("Title,Class Name\nNice,Tops\n").await.err().unwrap();
  assert!(format!("{err:#}").contains("Review Text"));
}

//! Review records and the ordered corpus built at startup

use anyhow::{anyhow, Result};

use crate::dataset::ReviewRow;
use crate::server::models::topic::Topic;
use crate::server::services::similarity::cosine_similarity;

/// Metadata key holding a review's category label in the vector store
pub const CLASS_NAME_KEY: &str = "Class Name";

/// Label reported for reviews without a category
pub const UNKNOWN_CLASS: &str = "Unknown";

/// Vector store id of the review at `index` in load order
fn review_id(index: usize) -> String {
  format!("review_{index}")
}

/// A loaded review with its embedding and topic scores
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
  /// Vector store id (`review_<index>`)
  pub id: String,
  /// Position in load order
  pub index: usize,
  pub text: String,
  pub class_name: Option<String>,
  pub embedding: Vec<f32>,
  /// Cosine similarity to each topic, indexed by `Topic::index`
  pub topic_scores: [f32; Topic::COUNT],
}

impl Review {
  pub fn score(&self, topic: Topic) -> f32 {
    self.topic_scores[topic.index()]
  }

  pub fn class_name_or_unknown(&self) -> &str {
    self.class_name.as_deref().unwrap_or(UNKNOWN_CLASS)
  }
}

/// Every review in load order, scored against every topic
#[derive(Debug, Clone)]
pub struct ReviewCorpus {
  reviews: Vec<Review>,
  dimension: usize,
}

impl ReviewCorpus {
  /// Pair rows with their embeddings and score every review against every topic.
  ///
  /// `embeddings` must hold one vector per row, in row order; `topic_embeddings`
  /// one vector per topic, in `Topic::ALL` order.
  pub fn build(
    rows: Vec<ReviewRow>,
    embeddings: Vec<Vec<f32>>,
    topic_embeddings: Vec<Vec<f32>>,
  ) -> Result<Self> {
    if rows.len() != embeddings.len() {
      return Err(anyhow!(
        "review/embedding count mismatch: {} rows, {} embeddings",
        rows.len(),
        embeddings.len()
      ));
    }

    if topic_embeddings.len() != Topic::COUNT {
      return Err(anyhow!(
        "expected {} topic embeddings, got {}",
        Topic::COUNT,
        topic_embeddings.len()
      ));
    }

    let dimension = topic_embeddings[0].len();
    if dimension == 0 {
      return Err(anyhow!("topic embeddings are empty"));
    }

    let mut vectors = topic_embeddings.iter().chain(embeddings.iter());
    if let Some(bad) = vectors.find(|e| e.len() != dimension) {
      return Err(anyhow!("embedding dimension mismatch: expected {dimension}, got {}", bad.len()));
    }

    let reviews = rows
      .into_iter()
      .zip(embeddings)
      .enumerate()
      .map(|(index, (row, embedding))| {
        let mut topic_scores = [0.0; Topic::COUNT];
        for topic in Topic::ALL {
          topic_scores[topic.index()] =
            cosine_similarity(&embedding, &topic_embeddings[topic.index()]);
        }

        Review {
          id: review_id(index),
          index,
          text: row.text,
          class_name: row.class_name,
          embedding,
          topic_scores,
        }
      })
      .collect();

    Ok(Self { reviews, dimension })
  }

  pub fn len(&self) -> usize {
    self.reviews.len()
  }

  pub fn is_empty(&self) -> bool {
    self.reviews.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&Review> {
    self.reviews.get(index)
  }

  pub fn reviews(&self) -> &[Review] {
    &self.reviews
  }

  /// Embedding dimension shared by reviews and topics
  pub fn dimension(&self) -> usize {
    self.dimension
  }

  /// The `top_n` reviews most similar to `topic`, best first.
  ///
  /// Equal scores keep load order, so the ranking is deterministic.
  pub fn rank_by_topic(&self, topic: Topic, top_n: usize) -> Vec<&Review> {
    let top_n = top_n.min(self.reviews.len());
    if top_n == 0 {
      return Vec::new();
    }

    let order = |a: &&Review, b: &&Review| {
      b.score(topic).total_cmp(&a.score(topic)).then_with(|| a.index.cmp(&b.index))
    };

    let mut ranked: Vec<&Review> = self.reviews.iter().collect();
    if top_n < ranked.len() {
      ranked.select_nth_unstable_by(top_n - 1, order);
      ranked.truncate(top_n);
    }
    ranked.sort_unstable_by(order);
    ranked
  }
}

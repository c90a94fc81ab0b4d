//! Sentence embedding interface and the pooling helpers shared by encoders

use anyhow::{anyhow, Result};
use std::sync::Arc;

/// Default sentence encoder on the HuggingFace hub
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Turns text into fixed-width vectors.
///
/// Implementations are synchronous and may be CPU heavy; async callers go
/// through [`embed_query`] or `spawn_blocking`.
pub trait Embedder: Send + Sync {
  /// Model identifier reported by `/status`
  fn model_name(&self) -> &str;

  fn embed(&self, text: &str) -> Result<Vec<f32>>;

  /// Embed several texts, preserving order
  fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    texts.iter().map(|text| self.embed(text)).collect()
  }
}

/// Embed a single query off the async runtime
pub async fn embed_query(embedder: Arc<dyn Embedder>, query: String) -> Result<Vec<f32>> {
  tokio::task::spawn_blocking(move || embedder.embed(&query))
    .await
    .map_err(|e| anyhow!("Embedding task failed: {e}"))?
}

/// Embed a batch off the async runtime
pub async fn embed_documents(
  embedder: Arc<dyn Embedder>,
  texts: Vec<String>,
) -> Result<Vec<Vec<f32>>> {
  tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
    .await
    .map_err(|e| anyhow!("Embedding task failed: {e}"))?
}

/// Average token vectors over the sequence, counting only tokens the
/// attention mask keeps.
///
/// `embedding` is a `[batch, seq_len, hidden]` tensor as `(shape, data)`;
/// only the first batch entry is pooled.
pub fn mean_pool(embedding: (&[i64], &[f32]), attention_mask: &[u32]) -> Result<Vec<f32>> {
  let (shape, data) = embedding;

  if shape.len() != 3 {
    return Err(anyhow!("Expected a 3-d hidden state tensor, got shape {shape:?}"));
  }

  let seq_length = usize::try_from(shape[1])?;
  let hidden_size = usize::try_from(shape[2])?;

  if data.len() < seq_length * hidden_size {
    return Err(anyhow!(
      "Hidden state holds {} values, shape {shape:?} needs {}",
      data.len(),
      seq_length * hidden_size
    ));
  }

  let mut pooled = vec![0.0f32; hidden_size];
  let mut kept = 0.0f32;

  for (token_idx, token) in data.chunks_exact(hidden_size).take(seq_length).enumerate() {
    let weight = attention_mask.get(token_idx).copied().unwrap_or(1) as f32;
    if weight == 0.0 {
      continue;
    }

    kept += weight;
    for (acc, &value) in pooled.iter_mut().zip(token) {
      *acc += value * weight;
    }
  }

  let divisor = kept.max(1e-9);
  for value in pooled.iter_mut() {
    *value /= divisor;
  }

  Ok(pooled)
}

/// Normalize embedding vector to unit length for consistent similarity comparisons
pub fn normalize_embedding(mut embedding: Vec<f32>) -> Result<Vec<f32>> {
  let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

  if magnitude < f32::EPSILON {
    tracing::warn!("Zero-magnitude embedding detected - returning unchanged");
    return Ok(embedding);
  }

  for value in embedding.iter_mut() {
    *value /= magnitude;
  }

  Ok(embedding)
}

//! In-process vector store
//!
//! Exact nearest-neighbour search over a named collection held in memory.
//! Nothing is persisted; the collection lives as long as the process.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

use crate::server::services::vector_database::{
  DistanceMetric, DocumentBatch, Metadata, VectorDatabase, VectorSearchResult, VectorStoreError,
};

/// Largest batch accepted by a single insert
pub const DEFAULT_MAX_BATCH_SIZE: usize = 5000;

#[derive(Debug)]
struct StoredDocument {
  id: String,
  document: String,
  embedding: Vec<f32>,
  metadata: Metadata,
}

#[derive(Debug, Default)]
struct Collection {
  documents: Vec<StoredDocument>,
  ids: HashSet<String>,
  dimension: Option<usize>,
}

/// Memory-backed collection implementing `VectorDatabase`
#[derive(Debug)]
pub struct MemoryVectorStore {
  name: String,
  metric: DistanceMetric,
  max_batch_size: usize,
  collection: RwLock<Collection>,
}

impl MemoryVectorStore {
  pub fn new(name: &str, metric: DistanceMetric) -> Self {
    Self {
      name: name.to_string(),
      metric,
      max_batch_size: DEFAULT_MAX_BATCH_SIZE,
      collection: RwLock::new(Collection::default()),
    }
  }

  /// Check a batch against the collection without modifying it
  fn validate(
    &self,
    collection: &Collection,
    batch: &DocumentBatch,
  ) -> Result<(), VectorStoreError> {
    let size = batch.ids.len();
    if batch.documents.len() != size
      || batch.embeddings.len() != size
      || batch.metadatas.len() != size
    {
      return Err(VectorStoreError::LengthMismatch {
        ids: size,
        documents: batch.documents.len(),
        embeddings: batch.embeddings.len(),
        metadatas: batch.metadatas.len(),
      });
    }

    if size > self.max_batch_size {
      return Err(VectorStoreError::BatchTooLarge { size, max: self.max_batch_size });
    }

    let mut seen = HashSet::with_capacity(size);
    let mut dimension = collection.dimension;

    for (id, embedding) in batch.ids.iter().zip(&batch.embeddings) {
      if collection.ids.contains(id) || !seen.insert(id.as_str()) {
        return Err(VectorStoreError::DuplicateId(id.clone()));
      }

      if embedding.is_empty() {
        return Err(VectorStoreError::EmptyEmbedding(id.clone()));
      }

      match dimension {
        Some(expected) if expected != embedding.len() => {
          return Err(VectorStoreError::DimensionMismatch { expected, actual: embedding.len() });
        }
        Some(_) => {}
        None => dimension = Some(embedding.len()),
      }
    }

    Ok(())
  }
}

#[async_trait]
impl VectorDatabase for MemoryVectorStore {
  fn name(&self) -> &str {
    &self.name
  }

  fn max_batch_size(&self) -> usize {
    self.max_batch_size
  }

  async fn add_batch(&self, batch: DocumentBatch) -> Result<()> {
    let mut collection = self.collection.write().await;
    self.validate(&collection, &batch)?;

    if let Some(first) = batch.embeddings.first() {
      collection.dimension.get_or_insert(first.len());
    }

    let DocumentBatch { ids, documents, embeddings, metadatas } = batch;
    collection.documents.reserve(ids.len());

    for (((id, document), embedding), metadata) in
      ids.into_iter().zip(documents).zip(embeddings).zip(metadatas)
    {
      collection.ids.insert(id.clone());
      collection.documents.push(StoredDocument { id, document, embedding, metadata });
    }

    tracing::debug!(
      "Collection '{}' now holds {} documents",
      self.name,
      collection.documents.len()
    );

    Ok(())
  }

  async fn query(&self, query_embedding: &[f32], top_n: usize) -> Result<Vec<VectorSearchResult>> {
    let collection = self.collection.read().await;

    if let Some(expected) = collection.dimension {
      if expected != query_embedding.len() {
        return Err(
          VectorStoreError::DimensionMismatch { expected, actual: query_embedding.len() }.into(),
        );
      }
    }

    if top_n == 0 || collection.documents.is_empty() {
      return Ok(Vec::new());
    }

    let mut scored: Vec<(usize, f32)> = collection
      .documents
      .iter()
      .enumerate()
      .map(|(position, stored)| {
        (position, self.metric.distance(query_embedding, &stored.embedding))
      })
      .collect();

    // stable: equal distances keep insertion order
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    scored.truncate(top_n);

    let results = scored
      .into_iter()
      .map(|(position, distance)| {
        let stored = &collection.documents[position];
        VectorSearchResult {
          id: stored.id.clone(),
          document: stored.document.clone(),
          metadata: stored.metadata.clone(),
          distance,
        }
      })
      .collect();

    Ok(results)
  }

  async fn count(&self) -> Result<usize> {
    Ok(self.collection.read().await.documents.len())
  }
}

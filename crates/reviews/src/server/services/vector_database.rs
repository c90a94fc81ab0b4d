//! Vector database abstraction layer for review storage and retrieval
//!
//! This module provides a generic interface for vector database operations,
//! allowing different implementations to be swapped without changing the
//! startup pipeline or the request handlers.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::server::services::similarity::{cosine_similarity, dot, squared_l2_distance};

/// Per-document metadata
pub type Metadata = HashMap<String, String>;

/// Generic search result from vector similarity operations
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchResult {
  /// Unique identifier for the result
  pub id: String,
  /// Stored document text
  pub document: String,
  /// Stored metadata
  pub metadata: Metadata,
  /// Distance to the query under the store's metric (lower is closer)
  pub distance: f32,
}

/// Parallel columns for a bulk insert
#[derive(Debug, Clone, Default)]
pub struct DocumentBatch {
  pub ids: Vec<String>,
  pub documents: Vec<String>,
  pub embeddings: Vec<Vec<f32>>,
  pub metadatas: Vec<Metadata>,
}

impl DocumentBatch {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      ids: Vec::with_capacity(capacity),
      documents: Vec::with_capacity(capacity),
      embeddings: Vec::with_capacity(capacity),
      metadatas: Vec::with_capacity(capacity),
    }
  }

  pub fn push(&mut self, id: String, document: String, embedding: Vec<f32>, metadata: Metadata) {
    self.ids.push(id);
    self.documents.push(document);
    self.embeddings.push(embedding);
    self.metadatas.push(metadata);
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }
}

#[derive(Debug, Error, PartialEq)]
pub enum VectorStoreError {
  #[error(
    "ragged batch: ids={ids} documents={documents} embeddings={embeddings} metadatas={metadatas}"
  )]
  LengthMismatch { ids: usize, documents: usize, embeddings: usize, metadatas: usize },

  #[error("batch of {size} exceeds the maximum batch size of {max}")]
  BatchTooLarge { size: usize, max: usize },

  #[error("duplicate id '{0}'")]
  DuplicateId(String),

  #[error("embedding dimension mismatch: collection has {expected}, got {actual}")]
  DimensionMismatch { expected: usize, actual: usize },

  #[error("empty embedding for id '{0}'")]
  EmptyEmbedding(String),
}

/// Distance function used for nearest-neighbour ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DistanceMetric {
  /// Squared euclidean distance
  #[default]
  L2,
  /// `1 - cosine similarity`
  Cosine,
  /// `1 - dot product`
  InnerProduct,
}

impl DistanceMetric {
  pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
    match self {
      DistanceMetric::L2 => squared_l2_distance(a, b),
      DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
      DistanceMetric::InnerProduct => 1.0 - dot(a, b),
    }
  }

  pub const fn as_str(self) -> &'static str {
    match self {
      DistanceMetric::L2 => "l2",
      DistanceMetric::Cosine => "cosine",
      DistanceMetric::InnerProduct => "ip",
    }
  }
}

impl fmt::Display for DistanceMetric {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for DistanceMetric {
  type Err = anyhow::Error;

  fn from_str(name: &str) -> Result<Self> {
    match name {
      "l2" => Ok(DistanceMetric::L2),
      "cosine" => Ok(DistanceMetric::Cosine),
      "ip" => Ok(DistanceMetric::InnerProduct),
      other => {
        Err(anyhow::anyhow!("unknown distance metric '{other}' (expected l2, cosine or ip)"))
      }
    }
  }
}

/// Vector database interface for storing and searching review embeddings
#[async_trait]
pub trait VectorDatabase: Send + Sync {
  /// Collection name
  fn name(&self) -> &str;

  /// Largest batch `add_batch` accepts
  fn max_batch_size(&self) -> usize;

  /// Store a batch of documents; either the whole batch is stored or none of it
  async fn add_batch(&self, batch: DocumentBatch) -> Result<()>;

  /// The `top_n` stored documents nearest to `query_embedding`, nearest first
  async fn query(&self, query_embedding: &[f32], top_n: usize) -> Result<Vec<VectorSearchResult>>;

  /// Number of stored documents
  async fn count(&self) -> Result<usize>;
}

//! Application context shared by every request handler

use std::sync::Arc;

use crate::server::models::ReviewCorpus;
use crate::server::services::embeddings::Embedder;
use crate::server::services::vector_database::VectorDatabase;

/// Everything built at startup. Read-only once the server is listening.
pub struct AppContext {
  /// Encoder used for incoming text queries
  pub embedder: Arc<dyn Embedder>,
  /// Reviews in load order with their topic scores
  pub corpus: ReviewCorpus,
  /// Nearest-neighbour index over the review embeddings
  pub store: Arc<dyn VectorDatabase>,
}

pub type SharedContext = Arc<AppContext>;

impl AppContext {
  pub fn new(
    embedder: Arc<dyn Embedder>,
    corpus: ReviewCorpus,
    store: Arc<dyn VectorDatabase>,
  ) -> Self {
    Self { embedder, corpus, store }
  }

  pub fn shared(self) -> SharedContext {
    Arc::new(self)
  }
}

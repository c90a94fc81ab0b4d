//! Startup pipeline and REST server lifecycle
//!
//! Startup runs once, before the listener is bound: load the dataset, embed
//! every review and topic, score reviews against topics, then populate the
//! vector store. Any failure aborts startup.

use anyhow::{anyhow, Context, Result};
use axum::serve;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::dataset::{load_reviews, DatasetColumns};
use crate::server::models::review::{ReviewCorpus, CLASS_NAME_KEY};
use crate::server::models::Topic;
use crate::server::routing::create_app;
use crate::server::services::embeddings::{embed_documents, Embedder};
use crate::server::services::memory_store::{MemoryVectorStore, DEFAULT_MAX_BATCH_SIZE};
use crate::server::services::vector_database::{
  DistanceMetric, DocumentBatch, Metadata, VectorDatabase,
};
use crate::server::state::{AppContext, SharedContext};

/// Name of the vector store collection holding the reviews
pub const COLLECTION_NAME: &str = "reviews";

/// Reviews embedded per progress step during startup
pub const ENCODE_CHUNK: usize = 1000;

/// Everything the startup pipeline needs besides the encoder
#[derive(Debug, Clone)]
pub struct ServiceConfig {
  /// CSV file holding the reviews
  pub dataset: PathBuf,
  pub columns: DatasetColumns,
  /// Entries per vector store insert, capped at the store's own maximum
  pub insert_batch_size: usize,
  pub metric: DistanceMetric,
}

impl ServiceConfig {
  pub fn new(dataset: impl Into<PathBuf>) -> Self {
    Self {
      dataset: dataset.into(),
      columns: DatasetColumns::default(),
      insert_batch_size: DEFAULT_MAX_BATCH_SIZE,
      metric: DistanceMetric::default(),
    }
  }
}

/// Run the startup pipeline and return the context handlers will share
pub async fn build_context(
  config: &ServiceConfig,
  embedder: Arc<dyn Embedder>,
) -> Result<AppContext> {
  let rows = load_reviews(&config.dataset, &config.columns)
    .with_context(|| format!("Failed to load dataset {}", config.dataset.display()))?;
  tracing::info!("Loaded {} reviews from {}", rows.len(), config.dataset.display());

  let texts: Vec<String> = rows.iter().map(|row| row.text.clone()).collect();
  let embeddings = encode_reviews(embedder.clone(), texts).await?;

  let topic_names: Vec<String> = Topic::names().into_iter().map(str::to_string).collect();
  let topic_embeddings =
    embed_documents(embedder.clone(), topic_names).await.context("Failed to embed topics")?;

  let corpus = ReviewCorpus::build(rows, embeddings, topic_embeddings)?;
  tracing::info!(
    "Scored {} reviews against {} topics ({} dimensions)",
    corpus.len(),
    Topic::COUNT,
    corpus.dimension()
  );

  let store = MemoryVectorStore::new(COLLECTION_NAME, config.metric);
  tracing::info!("Populating collection '{}' ({} distance)", COLLECTION_NAME, config.metric);
  populate_store(&store, &corpus, config.insert_batch_size).await?;

  Ok(AppContext::new(embedder, corpus, Arc::new(store)))
}

/// Embed review texts in chunks, logging progress after each
async fn encode_reviews(
  embedder: Arc<dyn Embedder>,
  texts: Vec<String>,
) -> Result<Vec<Vec<f32>>> {
  let total = texts.len();
  let mut embeddings = Vec::with_capacity(total);

  for chunk in texts.chunks(ENCODE_CHUNK) {
    let vectors =
      embed_documents(embedder.clone(), chunk.to_vec()).await.context("Failed to embed reviews")?;

    if vectors.len() != chunk.len() {
      return Err(anyhow!(
        "Encoder returned {} embeddings for {} reviews",
        vectors.len(),
        chunk.len()
      ));
    }

    embeddings.extend(vectors);
    tracing::info!("Encoded {}/{} reviews", embeddings.len(), total);
  }

  Ok(embeddings)
}

/// Insert every review into the store in consecutive batches no larger than
/// either `insert_batch_size` or the store's maximum
async fn populate_store(
  store: &dyn VectorDatabase,
  corpus: &ReviewCorpus,
  insert_batch_size: usize,
) -> Result<()> {
  let batch_size = insert_batch_size.min(store.max_batch_size()).max(1);

  for (batch_index, reviews) in corpus.reviews().chunks(batch_size).enumerate() {
    let mut batch = DocumentBatch::with_capacity(reviews.len());

    for review in reviews {
      let mut metadata = Metadata::new();
      if let Some(class_name) = &review.class_name {
        metadata.insert(CLASS_NAME_KEY.to_string(), class_name.clone());
      }
      batch.push(review.id.clone(), review.text.clone(), review.embedding.clone(), metadata);
    }

    store
      .add_batch(batch)
      .await
      .with_context(|| format!("Failed to insert batch {batch_index} into '{}'", store.name()))?;
  }

  tracing::info!("Collection '{}' holds {} reviews", store.name(), store.count().await?);
  Ok(())
}

/// Start the REST server and serve until Ctrl+C or SIGTERM
pub async fn start_server(addr: SocketAddr, context: SharedContext) -> Result<()> {
  let app = create_app(context);

  let listener =
    TcpListener::bind(addr).await.with_context(|| format!("Failed to bind {addr}"))?;
  let local_addr = listener.local_addr()?;

  bentley::announce(&format!("Review Search API listening on http://{local_addr}"));

  serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| anyhow!("Server error: {}", e))?;

  tracing::info!("Server shutdown gracefully");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
  };

  #[cfg(unix)]
  let terminate = async {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
      .expect("failed to install signal handler")
      .recv()
      .await;
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    () = ctrl_c => {},
    () = terminate => {},
  }

  tracing::info!("Shutdown signal received");
}

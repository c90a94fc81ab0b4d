//! Review Search REST Server
//!
//! Loads the review dataset, builds the embedding index and topic rankings,
//! then serves the search API until interrupted.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use reviews::dataset::{DatasetColumns, DEFAULT_LABEL_COLUMN, DEFAULT_TEXT_COLUMN};
use reviews::server::services::embeddings::{Embedder, DEFAULT_MODEL};
use reviews::server::services::vector_database::DistanceMetric;
use reviews::server::startup::{build_context, start_server, ServiceConfig};

#[derive(Parser)]
#[command(name = "reviews_server")]
#[command(about = "Review Search REST API Server")]
#[command(version)]
struct Args {
  /// CSV file holding the reviews
  #[arg(long, env = "REVIEWS_DATASET", default_value = "Data.csv")]
  dataset: PathBuf,

  /// Server bind address
  #[arg(long, env = "REVIEWS_BIND", default_value = "127.0.0.1:8000")]
  bind: SocketAddr,

  /// HuggingFace repository of the sentence embedding model
  #[arg(long, env = "REVIEWS_EMBEDDING_MODEL", default_value = DEFAULT_MODEL)]
  model: String,

  /// Column holding the review text
  #[arg(long, env = "REVIEWS_TEXT_COLUMN", default_value = DEFAULT_TEXT_COLUMN)]
  text_column: String,

  /// Column holding the review's category label
  #[arg(long, env = "REVIEWS_LABEL_COLUMN", default_value = DEFAULT_LABEL_COLUMN)]
  label_column: String,

  /// Distance used by text search (l2, cosine or ip)
  #[arg(long, env = "REVIEWS_METRIC", default_value_t = DistanceMetric::L2)]
  metric: DistanceMetric,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let options = bentley::LogOptions::new(bentley::default_filter("reviews", args.verbose));
  bentley::init(&options).map_err(|e| anyhow!("Failed to initialise logging: {e}"))?;

  tracing::info!("Starting Review Search Server v{}", env!("CARGO_PKG_VERSION"));

  let embedder = load_embedder(&args.model).await?;

  let mut config = ServiceConfig::new(args.dataset);
  config.columns = DatasetColumns { text: args.text_column, label: args.label_column };
  config.metric = args.metric;

  let context = build_context(&config, embedder).await?;

  start_server(args.bind, context.shared()).await
}

#[cfg(feature = "ml-features")]
async fn load_embedder(model: &str) -> Result<Arc<dyn Embedder>> {
  let embedder = reviews::server::services::onnx::OnnxEmbedder::load(model).await?;
  Ok(Arc::new(embedder))
}

#[cfg(not(feature = "ml-features"))]
async fn load_embedder(_model: &str) -> Result<Arc<dyn Embedder>> {
  Err(anyhow!("ML features not available: rebuild with the 'ml-features' feature"))
}

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use reviews::server::services::embeddings::Embedder;
use reviews::server::startup::{build_context, ServiceConfig};
use reviews::server::state::{AppContext, SharedContext};

pub const VOCABULARY_DIM: usize = 512;

/// Bag-of-words encoder: one axis per distinct lowercase word, unit length.
///
/// A topic name embeds to the axis of that word, so a review's topic score is
/// the share of its words equal to the topic, which keeps expected rankings
/// easy to work out by hand.
#[derive(Default)]
pub struct VocabularyEmbedder {
  vocabulary: Mutex<HashMap<String, usize>>,
}

impl Embedder for VocabularyEmbedder {
  fn model_name(&self) -> &str {
    "test/vocabulary"
  }

  fn embed(&self, text: &str) -> Result<Vec<f32>> {
    let mut vocabulary = self.vocabulary.lock().map_err(|_| anyhow!("vocabulary poisoned"))?;
    let mut vector = vec![0.0f32; VOCABULARY_DIM];

    let lowered = text.to_lowercase();
    let words = lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty());

    for word in words {
      let next = vocabulary.len();
      let axis = *vocabulary.entry(word.to_string()).or_insert(next);
      vector[axis % VOCABULARY_DIM] += 1.0;
    }

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
      vector.iter_mut().for_each(|x| *x /= norm);
    }
    Ok(vector)
  }
}

/// Encoder whose every call fails
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
  fn model_name(&self) -> &str {
    "test/failing"
  }

  fn embed(&self, _text: &str) -> Result<Vec<f32>> {
    Err(anyhow!("encoder offline"))
  }
}

/// Encoder that works during startup and fails afterwards
pub struct FlakyEmbedder {
  inner: VocabularyEmbedder,
  healthy: std::sync::atomic::AtomicBool,
}

impl FlakyEmbedder {
  pub fn new() -> Self {
    Self { inner: VocabularyEmbedder::default(), healthy: true.into() }
  }

  pub fn break_down(&self) {
    self.healthy.store(false, std::sync::atomic::Ordering::SeqCst);
  }
}

impl Embedder for FlakyEmbedder {
  fn model_name(&self) -> &str {
    "test/flaky"
  }

  fn embed(&self, text: &str) -> Result<Vec<f32>> {
    if self.healthy.load(std::sync::atomic::Ordering::SeqCst) {
      self.inner.embed(text)
    } else {
      Err(anyhow!("encoder offline"))
    }
  }
}

/// Sample of the clothing review dataset.
///
/// Two rows lack review text and are dropped, leaving seven reviews indexed
/// 0..=6 in this order. Review 5 has no class name.
pub const REVIEWS_CSV: &str = "\
Clothing ID,Age,Title,Review Text,Rating,Class Name
767,33,,Absolutely wonderful - silky and sexy and comfortable,4,Intimates
1080,34,,,5,Dresses
1077,60,Design flaws,\"Love this dress! it's sooo pretty, i happened to find it\",5,Dresses
1049,50,My favorite buy!,The quality of this fabric is excellent and the price was fair,5,Knits
847,47,Flattering shirt,\"Runs small, order a size up for a better fit\",4,Pants
1080,49,Not for the very petite,\"So comfortable, great comfort for lounging\",2,Lounge
858,39,Cagrcoal shimmer fun,Great price for the quality,5,
858,39,,NaN,5,Knits
1077,24,Flattering,Fits true to size and the fit is perfect,5,Tops
";

/// Texts of the retained reviews, by index
pub const REVIEW_TEXTS: [&str; 7] = [
  "Absolutely wonderful - silky and sexy and comfortable",
  "Love this dress! it's sooo pretty, i happened to find it",
  "The quality of this fabric is excellent and the price was fair",
  "Runs small, order a size up for a better fit",
  "So comfortable, great comfort for lounging",
  "Great price for the quality",
  "Fits true to size and the fit is perfect",
];

pub fn write_dataset(contents: &str) -> Result<(TempDir, PathBuf)> {
  let dir = TempDir::new()?;
  let path = dir.path().join("Data.csv");
  std::fs::write(&path, contents)?;
  Ok((dir, path))
}

/// Build a context over `contents` with the vocabulary encoder
pub async fn context_for(contents: &str) -> Result<AppContext> {
  context_with(contents, Arc::new(VocabularyEmbedder::default())).await
}

pub async fn context_with(contents: &str, embedder: Arc<dyn Embedder>) -> Result<AppContext> {
  let (_dir, path) = write_dataset(contents)?;
  build_context(&ServiceConfig::new(path), embedder).await
}

pub async fn sample_context() -> SharedContext {
  context_for(REVIEWS_CSV).await.unwrap().shared()
}

//! Local ONNX sentence encoder
//!
//! Downloads a sentence-transformers export from the HuggingFace hub and runs
//! it on the CPU through ONNX Runtime. Output vectors are mean-pooled over the
//! attention mask and normalized to unit length.

use anyhow::{anyhow, Result};
use hf_hub::api::tokio::Api;
use ndarray::Array2;
use ort::{session::Session, value::Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tokenizers::{Tokenizer, TruncationParams};

use crate::server::services::embeddings::{mean_pool, normalize_embedding, Embedder};

const TOKENIZER_FILE: &str = "tokenizer.json";
const MODEL_FILE: &str = "onnx/model.onnx";

/// Longest token sequence fed to the encoder; longer texts are truncated
pub const MAX_SEQUENCE_LENGTH: usize = 256;

/// Trait for extracting tensor data - allows testing without ONNX complexity
trait EmbeddingOutput {
  fn get_tensor(&self, key: &str) -> Option<&dyn TensorData>;
}

trait TensorData {
  fn extract_f32_data(&self) -> Result<(&[i64], &[f32])>;
}

/// Trait abstractions for testable tensor preparation
trait TokenEncoding {
  fn get_ids(&self) -> &[u32];
  fn get_attention_mask(&self) -> &[u32];
  fn get_type_ids(&self) -> &[u32];
}

trait SessionInputs {
  fn input_names(&self) -> Vec<String>;
}

#[cfg(not(tarpaulin_include))]
impl<'s> EmbeddingOutput for ort::session::SessionOutputs<'s> {
  fn get_tensor(&self, key: &str) -> Option<&dyn TensorData> {
    self.get(key).map(|v| v as &dyn TensorData)
  }
}

#[cfg(not(tarpaulin_include))]
impl TensorData for ort::value::Value {
  fn extract_f32_data(&self) -> Result<(&[i64], &[f32])> {
    let (shape, data) = self.try_extract_tensor::<f32>()?;
    Ok((shape.as_ref(), data))
  }
}

#[cfg(not(tarpaulin_include))]
impl TokenEncoding for tokenizers::Encoding {
  fn get_ids(&self) -> &[u32] {
    self.get_ids()
  }
  fn get_attention_mask(&self) -> &[u32] {
    self.get_attention_mask()
  }
  fn get_type_ids(&self) -> &[u32] {
    self.get_type_ids()
  }
}

#[cfg(not(tarpaulin_include))]
impl SessionInputs for Session {
  fn input_names(&self) -> Vec<String> {
    self.inputs.iter().map(|input| input.name.to_string()).collect()
  }
}

struct ModelFiles {
  tokenizer_file: PathBuf,
  model_path: PathBuf,
}

/// ONNX Runtime session plus its tokenizer
pub struct OnnxEmbedder {
  model_name: String,
  session: Mutex<Session>,
  tokenizer: Tokenizer,
}

#[cfg(not(tarpaulin_include))]
impl OnnxEmbedder {
  /// Fetch (or reuse the cached copy of) `model` and open an inference session
  pub async fn load(model: &str) -> Result<Self> {
    tracing::info!("Loading embedding model {model}...");

    let files = Self::download_model(model).await?;
    let tokenizer = Self::load_tokenizer(files.tokenizer_file)?;
    let session = Self::load_model(files.model_path)?;

    tracing::info!("Embedding model ready");
    Ok(Self { model_name: model.to_string(), session: Mutex::new(session), tokenizer })
  }

  async fn download_model(model: &str) -> Result<ModelFiles> {
    let api = Api::new().map_err(|e| anyhow!("HF API initialization failed: {}", e))?;
    let repo = api.model(model.to_string());

    let tokenizer_file =
      repo.get(TOKENIZER_FILE).await.map_err(|e| anyhow!("Failed to download tokenizer: {}", e))?;

    let model_path =
      repo.get(MODEL_FILE).await.map_err(|e| anyhow!("Failed to download ONNX model: {}", e))?;

    Ok(ModelFiles { tokenizer_file, model_path })
  }

  fn load_tokenizer(path: PathBuf) -> Result<Tokenizer> {
    let mut tokenizer =
      Tokenizer::from_file(path).map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

    tokenizer.with_padding(None);
    tokenizer
      .with_truncation(Some(TruncationParams {
        max_length: MAX_SEQUENCE_LENGTH,
        ..Default::default()
      }))
      .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

    Ok(tokenizer)
  }

  fn load_model(model_path: PathBuf) -> Result<Session> {
    let session = Session::builder()?.commit_from_file(model_path)?;
    Ok(session)
  }
}

impl OnnxEmbedder {
  /// Testable tensor preparation logic
  fn prepare(
    tokens: &dyn TokenEncoding,
    session: &dyn SessionInputs,
  ) -> Result<HashMap<String, Value>> {
    let mut input = HashMap::new();
    input.insert("input_ids".to_string(), Self::to_tensor(tokens.get_ids())?);
    input.insert("attention_mask".to_string(), Self::to_tensor(tokens.get_attention_mask())?);

    let model_input_names = session.input_names();

    if model_input_names.iter().any(|name| name == "token_type_ids") {
      input.insert("token_type_ids".to_string(), Self::to_tensor(tokens.get_type_ids())?);
    }

    if model_input_names.iter().any(|name| name == "position_ids") {
      let position_ids: Vec<u32> = (0..tokens.get_ids().len() as u32).collect();
      input.insert("position_ids".to_string(), Self::to_tensor(&position_ids)?);
    }

    Ok(input)
  }

  fn to_tensor<T: Copy + Into<i64>>(values: &[T]) -> Result<Value> {
    let seq_len = values.len();
    let array: Array2<i64> =
      Array2::from_shape_vec((1, seq_len), values.iter().map(|&x| x.into()).collect())?;
    let tensor: Value = Value::from_array(array)?.into();
    Ok(tensor)
  }

  /// Testable tensor extraction logic
  fn extract_embedding(output: &dyn EmbeddingOutput, attention_mask: &[u32]) -> Result<Vec<f32>> {
    let tensor = output
      .get_tensor("last_hidden_state")
      .or_else(|| output.get_tensor("0"))
      .ok_or_else(|| anyhow!("No output found from model - expected 'last_hidden_state' or '0'"))?;

    let (shape, data) = tensor.extract_f32_data()?;
    mean_pool((shape, data), attention_mask)
  }
}

impl Embedder for OnnxEmbedder {
  fn model_name(&self) -> &str {
    &self.model_name
  }

  fn embed(&self, text: &str) -> Result<Vec<f32>> {
    let tokens =
      self.tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;

    let mut session = self.session.lock().map_err(|_| anyhow!("Failed to lock model session"))?;
    let input = Self::prepare(&tokens, &*session)?;
    let output = session.run(input)?;
    let pooled = Self::extract_embedding(&output, tokens.get_attention_mask())?;

    normalize_embedding(pooled)
  }
}

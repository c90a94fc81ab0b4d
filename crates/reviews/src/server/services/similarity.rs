//! Vector similarity and distance functions

/// Calculate cosine similarity between two embedding vectors
///
/// Returns a value between -1 and 1, where:
/// - 1 = identical direction (high similarity)
/// - 0 = orthogonal (no similarity), also returned for empty or zero vectors
/// - -1 = opposite direction (negative similarity)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() {
    tracing::warn!("Embedding dimension mismatch: {} vs {}", a.len(), b.len());
    return 0.0;
  }

  if a.is_empty() {
    return 0.0;
  }

  let mut dot = 0.0_f64;
  let mut norm_a = 0.0_f64;
  let mut norm_b = 0.0_f64;

  for (&x, &y) in a.iter().zip(b.iter()) {
    let (x, y) = (f64::from(x), f64::from(y));
    dot = x.mul_add(y, dot);
    norm_a = x.mul_add(x, norm_a);
    norm_b = y.mul_add(y, norm_b);
  }

  let denom = norm_a.sqrt() * norm_b.sqrt();
  if denom < 1e-12 {
    return 0.0;
  }

  // rounding can push parallel vectors a hair past 1
  (dot / denom).clamp(-1.0, 1.0) as f32
}

/// Dot product of two equal-length vectors
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
  a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Squared euclidean distance of two equal-length vectors
pub fn squared_l2_distance(a: &[f32], b: &[f32]) -> f32 {
  a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

pub mod embeddings;
pub mod memory_store;
#[cfg(feature = "ml-features")]
pub mod onnx;
pub mod search;
pub mod similarity;
pub mod vector_database;

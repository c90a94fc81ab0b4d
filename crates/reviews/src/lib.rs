//! Reviews - Semantic Search over Product Reviews
//!
//! Loads a review dataset once at startup, embeds every review and a fixed set
//! of topics, and serves nearest-neighbour text search and precomputed topic
//! rankings over a small REST API.

pub mod dataset;
pub mod server;

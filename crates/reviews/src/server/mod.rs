//! REST API module for the review search service
//!
//! Provides HTTP endpoints for semantic text search and topic rankings over a
//! review corpus loaded once at startup. Uses axum for routing.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routing;
pub mod services;
pub mod startup;
pub mod state;
pub mod types;

//! Request context and middleware for the review search API
//!
//! Every request gets a `RequestContext` carrying a fresh request id and the
//! request metadata. The context is logged on entry and exit and injected into
//! request extensions so handlers can tag their own log lines with it.

use axum::{
  extract::Request,
  http::{HeaderMap, Method, Uri},
  middleware::Next,
  response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Request metadata shared with handlers through `Extension`
#[derive(Debug, Clone)]
pub struct RequestContext {
  /// Unique ID for this request
  pub request_id: Uuid,
  /// HTTP method
  pub method: Method,
  /// Request URI
  pub uri: Uri,
  /// `User-Agent` header, or `none`
  pub user_agent: String,
}

impl RequestContext {
  pub fn new(method: Method, uri: Uri, headers: &HeaderMap) -> Self {
    let user_agent = headers
      .get("user-agent")
      .map(|v| v.to_str().unwrap_or("unknown"))
      .unwrap_or("none")
      .to_string();

    Self { request_id: Uuid::new_v4(), method, uri, user_agent }
  }

  /// Log request start
  pub fn log_request_start(&self) {
    tracing::debug!(user_agent = %self.user_agent, "Request started");
  }

  /// Log request completion with status
  pub fn log_request_complete(&self, status: u16, duration_ms: f64) {
    if status >= 500 {
      tracing::warn!(status, "Request failed ({duration_ms:.2}ms)");
    } else {
      tracing::info!(status, "Request completed ({duration_ms:.2}ms)");
    }
  }
}

/// Middleware to inject RequestContext into all requests
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
  let context =
    RequestContext::new(request.method().clone(), request.uri().clone(), request.headers());

  let span = tracing::info_span!(
    "request",
    id = %context.request_id,
    method = %context.method,
    path = %context.uri.path(),
  );

  async move {
    let start_time = Instant::now();
    context.log_request_start();

    request.extensions_mut().insert(context.clone());
    let response = next.run(request).await;

    let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
    context.log_request_complete(response.status().as_u16(), duration_ms);

    response
  }
  .instrument(span)
  .await
}

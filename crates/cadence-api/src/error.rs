//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use cadence_core::store::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error onto an HTTP-level error through the domain error
  /// it carries.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    if let Some(mapped) = e.domain().and_then(Self::from_domain) {
      return mapped;
    }
    Self::Store(Box::new(e))
  }

  fn from_domain(e: &cadence_core::Error) -> Option<Self> {
    if e.is_not_found() {
      Some(Self::NotFound(e.to_string()))
    } else if e.is_invalid_input() {
      Some(Self::BadRequest(e.to_string()))
    } else if e.is_conflict() {
      Some(Self::Conflict(e.to_string()))
    } else {
      None
    }
  }
}

impl From<cadence_core::Error> for ApiError {
  fn from(e: cadence_core::Error) -> Self {
    Self::from_domain(&e).unwrap_or_else(|| Self::Store(Box::new(e)))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

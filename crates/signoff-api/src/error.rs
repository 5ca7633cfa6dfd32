//! Error types and [`axum::response::IntoResponse`] implementation.

use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// The request did not carry a usable identifier. Always a client error.
#[derive(Debug, Error)]
pub enum ExtractError {
  #[error("missing path segment {position} for {key:?}")]
  MissingSegment { key: String, position: usize },

  #[error("path segment {position} is not valid UTF-8")]
  Encoding { position: usize },

  #[error("batch item {index} is missing {key:?}")]
  MissingField { index: usize, key: String },

  #[error(transparent)]
  Value(#[from] signoff_core::Error),

  #[error("invalid JSON body: {0}")]
  Json(#[from] serde_json::Error),

  #[error("cannot read request body: {0}")]
  Body(String),
}

impl IntoResponse for ExtractError {
  fn into_response(self) -> Response { crate::response::bad_request(&self.to_string()) }
}

/// A handler could not be built from the supplied shape and config.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error(transparent)]
  Shape(#[from] signoff_core::Error),

  #[error("invalid failure status: {0}")]
  Status(u16),
}

//! Router assembly errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid model: {0}")]
  Model(#[from] signoff_core::Error),

  #[error("invalid handler config: {0}")]
  Handler(#[from] signoff_api::ConfigError),

  #[error("resource path {0:?} is mounted more than once")]
  DuplicatePath(String),

  #[error("resource {0:?} has an empty path")]
  EmptyPath(String),
}

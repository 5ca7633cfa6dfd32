//! Error types for `signoff-core`.

use thiserror::Error;

use crate::shape::ScalarKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("model {0:?} declares no identifier fields")]
  NoIdentifierFields(String),

  #[error("model {model:?} has no field with key {key:?}")]
  UnknownField { model: String, key: String },

  #[error("model {model:?} declares key {key:?} more than once")]
  DuplicateKey { model: String, key: String },

  #[error("invalid {kind} value {value:?} for {key:?}")]
  InvalidValue {
    key:   String,
    kind:  ScalarKind,
    value: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

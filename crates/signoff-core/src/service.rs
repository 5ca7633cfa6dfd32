//! The service contracts handlers dispatch to.
//!
//! Implemented by business backends (e.g. `signoff-store-sqlite`). Handlers
//! depend on these traits only. All methods return `Send` futures so the
//! handlers can run on a multi-threaded runtime.

use std::future::Future;

use serde::Serialize;

use crate::{diff::DiffRecord, id::Identifier};

/// Approve or reject the pending change to a single resource.
pub trait ApprovalService: Send + Sync {
  /// Whatever the backend reports; serialized verbatim as the response body.
  type Output: Serialize + Send;
  type Error: std::error::Error + Send + Sync + 'static;

  fn approve(
    &self,
    id: Identifier,
  ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send + '_;

  fn reject(
    &self,
    id: Identifier,
  ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send + '_;
}

/// Approve or reject pending changes for many resources at once.
///
/// Both methods return the number of resources affected.
pub trait BatchApprovalService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn approve(
    &self,
    ids: Vec<Identifier>,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  fn reject(
    &self,
    ids: Vec<Identifier>,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;
}

/// Fetch the pending change for one resource. `None` means nothing is
/// pending.
pub trait DiffService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn diff(
    &self,
    id: Identifier,
  ) -> impl Future<Output = Result<Option<DiffRecord>, Self::Error>> + Send + '_;
}

/// Fetch pending changes for many resources. Resources with nothing pending
/// are left out of the result.
pub trait BatchDiffService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn diff(
    &self,
    ids: Vec<Identifier>,
  ) -> impl Future<Output = Result<Vec<DiffRecord>, Self::Error>> + Send + '_;
}

//! Integer outcome codes reported by approval services.

use serde::{Deserialize, Serialize};

/// The codes an [`ApprovalService`](crate::service::ApprovalService) uses to
/// describe the outcome of a single approve/reject call.
///
/// The handler layer never interprets these; it serializes them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
  /// No pending change exists for the identifier.
  pub not_found:     i32,
  pub success:       i32,
  /// The live record changed after the pending change was proposed.
  pub version_error: i32,
  pub error:         i32,
}

impl Default for StatusConfig {
  fn default() -> Self {
    Self {
      not_found:     0,
      success:       1,
      version_error: 2,
      error:         4,
    }
  }
}

//! The audit-log contract.

use async_trait::async_trait;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request facts an audit sink may record alongside an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditContext {
  pub user: Option<String>,
  pub ip:   Option<String>,
  pub path: String,
}

/// One service call's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
  pub resource:    String,
  pub action:      String,
  pub success:     bool,
  /// Empty on success; the service error text on failure.
  pub description: String,
}

/// Destination for audit entries.
///
/// Object-safe so handlers can hold any sink behind an `Arc<dyn AuditLog>`.
#[async_trait]
pub trait AuditLog: Send + Sync {
  async fn log(&self, ctx: &AuditContext, entry: &AuditEntry) -> Result<(), BoxError>;
}

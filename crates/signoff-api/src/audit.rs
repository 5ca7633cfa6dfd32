//! Audit-log and error-sink seams.
//!
//! Every service call made by a handler produces exactly one audit entry,
//! success or failure, when an [`AuditLog`] is attached. Audit failures are
//! reported through `tracing` and never change the HTTP response.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use axum::http::{HeaderMap, Uri};
pub use signoff_core::audit::{AuditContext, AuditEntry, AuditLog, BoxError};

const USER_HEADER: &str = "x-user-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Build the audit context for a request: user from `x-user-id`, ip from the
/// first hop of `x-forwarded-for`.
pub fn audit_context(uri: &Uri, headers: &HeaderMap) -> AuditContext {
  let header = |name: &str| {
    headers
      .get(name)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|v| !v.is_empty())
  };
  AuditContext {
    user: header(USER_HEADER).map(str::to_owned),
    ip:   header(FORWARDED_FOR_HEADER)
      .and_then(|v| v.split(',').next())
      .map(|v| v.trim().to_owned()),
    path: uri.path().to_owned(),
  }
}

/// Writes audit entries as structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudit;

#[async_trait]
impl AuditLog for TracingAudit {
  async fn log(&self, ctx: &AuditContext, entry: &AuditEntry) -> Result<(), BoxError> {
    tracing::info!(
      target: "signoff::audit",
      resource = %entry.resource,
      action = %entry.action,
      success = entry.success,
      user = ctx.user.as_deref().unwrap_or("-"),
      ip = ctx.ip.as_deref().unwrap_or("-"),
      path = %ctx.path,
      description = %entry.description,
      "audit"
    );
    Ok(())
  }
}

/// Process-wide sink for internal failure descriptions.
#[derive(Clone)]
pub struct ErrorLog(Arc<dyn Fn(&AuditContext, &str) + Send + Sync>);

impl ErrorLog {
  pub fn new(f: impl Fn(&AuditContext, &str) + Send + Sync + 'static) -> Self {
    Self(Arc::new(f))
  }

  pub fn write(&self, ctx: &AuditContext, message: &str) { (self.0)(ctx, message) }
}

impl Default for ErrorLog {
  fn default() -> Self {
    Self::new(|ctx, message| {
      tracing::error!(path = %ctx.path, "{message}");
    })
  }
}

impl fmt::Debug for ErrorLog {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("ErrorLog").finish_non_exhaustive()
  }
}

/// The audit and error sinks a handler reports through.
#[derive(Clone, Default)]
pub struct Sinks {
  pub audit: Option<Arc<dyn AuditLog>>,
  pub error: ErrorLog,
}

impl Sinks {
  /// Record one audit entry, if a sink is attached. Best-effort.
  pub async fn audit(&self, ctx: &AuditContext, entry: AuditEntry) {
    let Some(audit) = &self.audit else { return };
    if let Err(e) = audit.log(ctx, &entry).await {
      tracing::warn!(
        resource = %entry.resource,
        action = %entry.action,
        error = %e,
        "failed to write audit entry"
      );
    }
  }
}

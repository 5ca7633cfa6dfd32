//! HTTP handlers for approval and diff workflows.
//!
//! Four handlers wrap the service contracts from [`signoff_core::service`]:
//!
//! | Handler | Actions | Identifier source |
//! |---------|---------|-------------------|
//! | [`ApprovalHandler`] | `approve`, `reject` | path segments |
//! | [`BatchApprovalHandler`] | `approve`, `reject` | JSON body list |
//! | [`DiffHandler`] | `diff` | path segments |
//! | [`BatchDiffHandler`] | `diff` | JSON body list |
//!
//! Each handler is built once from a service, a [`ModelShape`] and a config
//! struct, then shared behind an `Arc`. Routing is the caller's
//! responsibility:
//!
//! ```rust,ignore
//! let users = Arc::new(ApprovalHandler::new(service, &shape, ApprovalConfig::default())?);
//! Router::new().route("/users/{id}/approve", post(move |req| async move { users.approve(req).await }))
//! ```
//!
//! [`ModelShape`]: signoff_core::ModelShape

pub mod audit;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod response;

pub use audit::{AuditContext, AuditEntry, AuditLog, ErrorLog, TracingAudit};
pub use config::{ApprovalConfig, DiffConfig};
pub use error::{ConfigError, ExtractError};
pub use handlers::{
  approval::ApprovalHandler, batch_approval::BatchApprovalHandler,
  batch_diff::BatchDiffHandler, diff::DiffHandler,
};

#[cfg(test)]
mod testing;

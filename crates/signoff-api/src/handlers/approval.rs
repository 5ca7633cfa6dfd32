//! Approve or reject a single resource identified by path segments.

use std::sync::Arc;

use axum::{
  extract::Request,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use signoff_core::{IdentityShape, ModelShape, service::ApprovalService};

use crate::{
  audit::{self, AuditLog, ErrorLog, Sinks},
  config::{self, ApprovalConfig},
  error::ConfigError,
  extract,
  handlers::Decision,
  response,
};

/// Dispatches `approve`/`reject` requests for one resource to an
/// [`ApprovalService`].
///
/// Service failures are answered with status 200 unless
/// [`ApprovalConfig::failure_status`] says otherwise; existing clients of
/// this endpoint read the mapped error body rather than the status.
pub struct ApprovalHandler<S> {
  service:        Arc<S>,
  identity:       IdentityShape,
  resource:       String,
  approve_action: String,
  reject_action:  String,
  offset:         usize,
  failure_status: StatusCode,
  sinks:          Sinks,
}

impl<S: ApprovalService> ApprovalHandler<S> {
  pub fn new(
    service: Arc<S>,
    shape: &ModelShape,
    config: ApprovalConfig,
  ) -> Result<Self, ConfigError> {
    Ok(Self {
      identity: shape.identity(&config.id_keys)?,
      resource: config.resource_for(shape),
      approve_action: config.approve_label(),
      reject_action: config.reject_label(),
      offset: config.offset,
      failure_status: config::failure_status(config.failure_status, StatusCode::OK)?,
      sinks: Sinks::default(),
      service,
    })
  }

  pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
    self.sinks.audit = Some(audit);
    self
  }

  pub fn with_error_log(mut self, error: ErrorLog) -> Self {
    self.sinks.error = error;
    self
  }

  pub fn identity(&self) -> &IdentityShape { &self.identity }

  pub fn resource(&self) -> &str { &self.resource }

  pub async fn approve(&self, req: Request) -> Response {
    self.decide(req, Decision::Approve).await
  }

  pub async fn reject(&self, req: Request) -> Response {
    self.decide(req, Decision::Reject).await
  }

  async fn decide(&self, req: Request, decision: Decision) -> Response {
    let action = match decision {
      Decision::Approve => &self.approve_action,
      Decision::Reject => &self.reject_action,
    };
    let ctx = audit::audit_context(req.uri(), req.headers());
    let id = match extract::build_id(req.uri().path(), &self.identity, self.offset) {
      Ok(id) => id,
      Err(e) => return e.into_response(),
    };

    tracing::debug!(resource = %self.resource, %action, %id, "dispatching");
    let result = match decision {
      Decision::Approve => self.service.approve(id).await,
      Decision::Reject => self.service.reject(id).await,
    };

    match result {
      Ok(out) => {
        response::succeed(&self.sinks, &ctx, &self.resource, action, StatusCode::OK, &out)
          .await
      }
      Err(e) => {
        response::handle_error(
          &self.sinks,
          &ctx,
          &self.resource,
          action,
          self.failure_status,
          &e,
        )
        .await
      }
    }
  }
}

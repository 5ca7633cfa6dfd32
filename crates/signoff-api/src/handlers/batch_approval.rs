//! Approve or reject many resources listed in the request body.

use std::sync::Arc;

use axum::{
  extract::Request,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use signoff_core::{IdentityShape, ModelShape, service::BatchApprovalService};

use crate::{
  audit::{self, AuditLog, ErrorLog, Sinks},
  config::{self, ApprovalConfig},
  error::ConfigError,
  extract,
  handlers::Decision,
  response,
};

/// Dispatches `approve`/`reject` requests whose body is a JSON list of
/// identifier objects to a [`BatchApprovalService`]. Responds with the count
/// the service reports.
pub struct BatchApprovalHandler<S> {
  service:        Arc<S>,
  identity:       IdentityShape,
  resource:       String,
  approve_action: String,
  reject_action:  String,
  failure_status: StatusCode,
  max_body_bytes: usize,
  sinks:          Sinks,
}

impl<S: BatchApprovalService> BatchApprovalHandler<S> {
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
      failure_status: config::failure_status(
        config.failure_status,
        StatusCode::INTERNAL_SERVER_ERROR,
      )?,
      max_body_bytes: config.max_body_bytes,
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
    let (parts, body) = req.into_parts();
    let ctx = audit::audit_context(&parts.uri, &parts.headers);
    let ids = match extract::read_body(body, self.max_body_bytes)
      .await
      .and_then(|bytes| extract::build_ids(&bytes, &self.identity))
    {
      Ok(ids) => ids,
      Err(e) => return e.into_response(),
    };

    tracing::debug!(resource = %self.resource, %action, count = ids.len(), "dispatching batch");
    let result = match decision {
      Decision::Approve => self.service.approve(ids).await,
      Decision::Reject => self.service.reject(ids).await,
    };

    match result {
      Ok(count) => {
        response::succeed(&self.sinks, &ctx, &self.resource, action, StatusCode::OK, &count)
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

#[cfg(test)]
mod tests {
  use serde_json::json;
  use signoff_core::{IdValue, ScalarKind};

  use super::*;
  use crate::testing::{FakeBatchApproval, RecordingAudit, body_json, body_text, request};

  fn shape() -> ModelShape {
    ModelShape::builder("Invoice")
      .id("id", "id", ScalarKind::Unsigned)
      .field("amount", "amount", ScalarKind::Float)
      .build()
      .unwrap()
  }

  fn handler(
    service: Arc<FakeBatchApproval>,
  ) -> (BatchApprovalHandler<FakeBatchApproval>, Arc<RecordingAudit>) {
    let audit = Arc::new(RecordingAudit::default());
    let handler = BatchApprovalHandler::new(service, &shape(), ApprovalConfig::default())
      .unwrap()
      .with_audit(audit.clone());
    (handler, audit)
  }

  #[tokio::test]
  async fn approve_forwards_every_listed_identifier() {
    let service = Arc::new(FakeBatchApproval::default());
    let (handler, audit) = handler(service.clone());

    let body = r#"[{"id": 1, "amount": 9.5}, {"id": 2}]"#;
    let resp = handler.approve(request("POST", "/invoices/batch/approve", body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!(2));

    let calls = service.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "approve");
    let ids: Vec<_> = calls[0].1.iter().map(|id| id.get("id").cloned()).collect();
    assert_eq!(ids, [Some(IdValue::Unsigned(1)), Some(IdValue::Unsigned(2))]);

    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].1.resource, "invoice");
    assert!(entries[0].1.success);
  }

  #[tokio::test]
  async fn malformed_body_returns_400() {
    let service = Arc::new(FakeBatchApproval::default());
    let (handler, audit) = handler(service.clone());

    let resp = handler.reject(request("POST", "/invoices/batch/reject", "[{")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(resp).await.starts_with("invalid JSON body"));
    assert!(service.calls().is_empty());
    assert!(audit.entries().is_empty());
  }

  #[tokio::test]
  async fn oversized_body_returns_400() {
    let service = Arc::new(FakeBatchApproval::default());
    let handler = BatchApprovalHandler::new(service.clone(), &shape(), ApprovalConfig {
      max_body_bytes: 4,
      ..Default::default()
    })
    .unwrap();

    let resp = handler.approve(request("POST", "/invoices/batch/approve", r#"[{"id": 1}]"#)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(service.calls().is_empty());
  }

  #[tokio::test]
  async fn service_failure_answers_500() {
    let service = Arc::new(FakeBatchApproval::failing());
    let (handler, audit) = handler(service);

    let resp = handler.reject(request("POST", "/invoices/batch/reject", r#"[{"id": 3}]"#)).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await, json!({"error": "Internal Server Error"}));

    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].1.action, "reject");
    assert!(!entries[0].1.success);
  }
}

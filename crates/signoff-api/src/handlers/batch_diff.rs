//! Fetch pending changes for many resources listed in the request body.

use std::sync::Arc;

use axum::{
  extract::Request,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};
use signoff_core::{
  IdentityShape, ModelShape,
  diff::{DiffModelConfig, DiffRecord},
  service::BatchDiffService,
};

use crate::{
  audit::{self, AuditLog, ErrorLog, Sinks},
  config::{self, DiffConfig},
  error::ConfigError,
  extract, response,
};

/// Dispatches `diff` requests whose body is a JSON list of identifier
/// objects to a [`BatchDiffService`].
///
/// Body objects are narrowed to the identifier keys before decoding, so
/// clients may post whole records.
pub struct BatchDiffHandler<S> {
  service:        Arc<S>,
  identity:       IdentityShape,
  resource:       String,
  action:         String,
  failure_status: StatusCode,
  max_body_bytes: usize,
  projection:     Option<DiffModelConfig>,
  sinks:          Sinks,
}

impl<S: BatchDiffService> BatchDiffHandler<S> {
  pub fn new(
    service: Arc<S>,
    shape: &ModelShape,
    config: DiffConfig,
  ) -> Result<Self, ConfigError> {
    Ok(Self {
      identity: shape.identity(&config.id_keys)?,
      resource: config.resource_for(shape),
      action: config.action_label(),
      failure_status: config::failure_status(
        config.failure_status,
        StatusCode::INTERNAL_SERVER_ERROR,
      )?,
      max_body_bytes: config.max_body_bytes,
      projection: config.projection,
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

  pub async fn diff(&self, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let ctx = audit::audit_context(&parts.uri, &parts.headers);
    let ids = match extract::read_body(body, self.max_body_bytes)
      .await
      .and_then(|bytes| extract::build_ids(&bytes, &self.identity))
    {
      Ok(ids) => ids,
      Err(e) => return e.into_response(),
    };

    match self.service.diff(ids).await {
      Ok(records) => {
        let body = render_list(&records, self.projection.as_ref());
        response::succeed(&self.sinks, &ctx, &self.resource, &self.action, StatusCode::OK, &body)
          .await
      }
      Err(e) => {
        response::handle_error(
          &self.sinks,
          &ctx,
          &self.resource,
          &self.action,
          self.failure_status,
          &e,
        )
        .await
      }
    }
  }
}

/// Response body: the raw list, or one projected object per record. An empty
/// list is always written raw.
#[derive(Serialize)]
#[serde(untagged)]
enum RenderedList<'a> {
  Raw(&'a [DiffRecord]),
  Projected(Vec<Map<String, Value>>),
}

fn render_list<'a>(
  records: &'a [DiffRecord],
  projection: Option<&DiffModelConfig>,
) -> RenderedList<'a> {
  match projection {
    Some(p) if !records.is_empty() => {
      RenderedList::Projected(records.iter().map(|r| r.project(p)).collect())
    }
    _ => RenderedList::Raw(records),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use signoff_core::{IdValue, ScalarKind};

  use super::*;
  use crate::testing::{FakeDiff, RecordingAudit, body_json, request};

  fn shape() -> ModelShape {
    ModelShape::builder("Membership")
      .id("tenant", "tenant", ScalarKind::String)
      .id("user_id", "userId", ScalarKind::Integer)
      .field("role", "role", ScalarKind::String)
      .build()
      .unwrap()
  }

  fn records() -> Vec<DiffRecord> {
    vec![
      DiffRecord {
        id:     Some(json!({"tenant": "acme", "userId": 1})),
        origin: None,
        value:  Some(json!({"role": "admin"})),
        by:     "bob".into(),
      },
      DiffRecord {
        id:     Some(json!({"tenant": "acme", "userId": 2})),
        origin: Some(json!({"role": "viewer"})),
        value:  Some(json!({"role": "editor"})),
        by:     String::new(),
      },
    ]
  }

  fn handler(
    service: FakeDiff,
    config: DiffConfig,
  ) -> (BatchDiffHandler<FakeDiff>, Arc<FakeDiff>, Arc<RecordingAudit>) {
    let service = Arc::new(service);
    let audit = Arc::new(RecordingAudit::default());
    let handler = BatchDiffHandler::new(service.clone(), &shape(), config)
      .unwrap()
      .with_audit(audit.clone());
    (handler, service, audit)
  }

  #[tokio::test]
  async fn extra_body_fields_are_stripped() {
    let (handler, service, audit) = handler(FakeDiff::returning(records()), DiffConfig::default());

    let body = r#"[
      {"tenant": "acme", "userId": 1, "role": "admin", "unexpected": {"deep": true}},
      {"tenant": "acme", "userId": "2"}
    ]"#;
    let resp = handler.diff(request("POST", "/memberships/batch/diff", body)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let ids = &service.calls()[0];
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0].len(), 2);
    assert_eq!(ids[1].get("userId"), Some(&IdValue::Integer(2)));

    let raw = body_json(resp).await;
    assert_eq!(raw.as_array().unwrap().len(), 2);
    assert_eq!(raw[0]["by"], "bob");
    assert!(raw[1].get("by").is_none());
    assert_eq!(audit.entries().len(), 1);
  }

  #[tokio::test]
  async fn projection_applies_to_every_record() {
    let config = DiffConfig {
      projection: Some(DiffModelConfig {
        id: "key".into(),
        origin: "was".into(),
        value: "now".into(),
        by: "who".into(),
        ..Default::default()
      }),
      ..Default::default()
    };
    let (handler, _, _) = handler(FakeDiff::returning(records()), config);

    let body = r#"[{"tenant": "acme", "userId": 1}, {"tenant": "acme", "userId": 2}]"#;
    let resp = handler.diff(request("POST", "/memberships/batch/diff", body)).await;
    assert_eq!(
      body_json(resp).await,
      json!([
        {"key": {"tenant": "acme", "userId": 1}, "now": {"role": "admin"}, "who": "bob"},
        {"key": {"tenant": "acme", "userId": 2}, "was": {"role": "viewer"}, "now": {"role": "editor"}}
      ])
    );
  }

  #[tokio::test]
  async fn empty_result_is_an_empty_list() {
    let config = DiffConfig {
      projection: Some(DiffModelConfig::default()),
      ..Default::default()
    };
    let (handler, _, _) = handler(FakeDiff::returning(vec![]), config);
    let resp = handler.diff(request("POST", "/memberships/batch/diff", "[]")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([]));
  }

  #[tokio::test]
  async fn single_and_batch_failure_statuses_differ() {
    use crate::{ApprovalConfig, ApprovalHandler, testing::FakeApproval};

    let approval = ApprovalHandler::new(
      Arc::new(FakeApproval::failing()),
      &shape(),
      ApprovalConfig::default(),
    )
    .unwrap();
    let single = approval.approve(request("POST", "/memberships/acme/1/approve", "")).await;

    let (batch, _, _) = handler(FakeDiff::failing(), DiffConfig::default());
    let listed = batch
      .diff(request("POST", "/memberships/batch/diff", r#"[{"tenant": "acme", "userId": 1}]"#))
      .await;

    assert_eq!(single.status(), StatusCode::OK);
    assert_eq!(listed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(single).await, body_json(listed).await);
  }
}

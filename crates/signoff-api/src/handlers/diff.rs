//! Fetch the pending change for a single resource.

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
  service::DiffService,
};

use crate::{
  audit::{self, AuditLog, ErrorLog, Sinks},
  config::{self, DiffConfig},
  error::ConfigError,
  extract, response,
};

/// Dispatches `diff` requests for one resource to a [`DiffService`],
/// optionally reshaping the record onto caller-chosen keys.
pub struct DiffHandler<S> {
  service:        Arc<S>,
  identity:       IdentityShape,
  resource:       String,
  action:         String,
  offset:         usize,
  failure_status: StatusCode,
  projection:     Option<DiffModelConfig>,
  sinks:          Sinks,
}

impl<S: DiffService> DiffHandler<S> {
  pub fn new(
    service: Arc<S>,
    shape: &ModelShape,
    config: DiffConfig,
  ) -> Result<Self, ConfigError> {
    Ok(Self {
      identity: shape.identity(&config.id_keys)?,
      resource: config.resource_for(shape),
      action: config.action_label(),
      offset: config.offset,
      failure_status: config::failure_status(
        config.failure_status,
        StatusCode::INTERNAL_SERVER_ERROR,
      )?,
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
    let ctx = audit::audit_context(req.uri(), req.headers());
    let id = match extract::build_id(req.uri().path(), &self.identity, self.offset) {
      Ok(id) => id,
      Err(e) => return e.into_response(),
    };

    match self.service.diff(id).await {
      Ok(record) => {
        let body = render(record.as_ref(), self.projection.as_ref());
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

/// Response body: the raw record (`null` when nothing is pending) or its
/// projection.
#[derive(Serialize)]
#[serde(untagged)]
enum Rendered<'a> {
  Raw(Option<&'a DiffRecord>),
  Projected(Map<String, Value>),
}

fn render<'a>(
  record: Option<&'a DiffRecord>,
  projection: Option<&DiffModelConfig>,
) -> Rendered<'a> {
  match (record, projection) {
    (Some(r), Some(p)) => Rendered::Projected(r.project(p)),
    (record, _) => Rendered::Raw(record),
  }
}

//! HTTP surface for signoff.
//!
//! Reads resource definitions from [`ServerConfig`] and mounts the four
//! approval/diff handlers for each one on an axum [`Router`], backed by a
//! [`SqliteStore`].

pub mod error;

pub use error::Error;

use std::{collections::HashSet, path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::Request,
  routing::{get, post},
};
use serde::Deserialize;
use signoff_api::{
  ApprovalConfig, ApprovalHandler, AuditLog, BatchApprovalHandler, BatchDiffHandler,
  DiffConfig, DiffHandler,
};
use signoff_core::{FieldDescriptor, ModelShape, status::StatusConfig};
use signoff_store_sqlite::SqliteStore;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub statuses:   StatusConfig,
  #[serde(default)]
  pub resources:  Vec<ResourceConfig>,
}

/// One resource exposed for approval.
#[derive(Debug, Deserialize, Clone)]
pub struct ResourceConfig {
  /// Model name, e.g. `UserRole`.
  pub model:    String,
  /// URL prefix, without slashes at either end. Defaults to the model name,
  /// dash-cased. May span several segments.
  #[serde(default)]
  pub path:     Option<String>,
  pub fields:   Vec<FieldDescriptor>,
  #[serde(default)]
  pub approval: ApprovalConfig,
  #[serde(default)]
  pub diff:     DiffConfig,
}

impl ResourceConfig {
  fn shape(&self) -> Result<ModelShape, Error> {
    Ok(ModelShape::from_fields(&self.model, self.fields.clone())?)
  }

  fn prefix(&self, shape: &ModelShape) -> Result<String, Error> {
    let prefix = match &self.path {
      Some(path) => path.trim_matches('/').to_owned(),
      None => shape.resource_name(),
    };
    if prefix.is_empty() {
      return Err(Error::EmptyPath(self.model.clone()));
    }
    Ok(prefix)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the router for every configured resource.
///
/// Per resource with prefix `p` and identifier fields `id0..idN`:
///
/// | Method | Path | Handler |
/// |--------|------|---------|
/// | POST | `/p/{id0}/…/{idN}/approve`, `/reject` | single approval |
/// | POST | `/p/batch/approve`, `/p/batch/reject` | batch approval |
/// | GET  | `/p/{id0}/…/{idN}/diff` | single diff |
/// | POST | `/p/batch/diff` | batch diff |
pub fn router(store: &SqliteStore, config: &ServerConfig) -> Result<Router, Error> {
  let audit: Arc<dyn AuditLog> = Arc::new(store.audit_log());
  let mut seen = HashSet::new();
  let mut app = Router::new();

  for resource in &config.resources {
    let shape = resource.shape()?;
    let prefix = resource.prefix(&shape)?;
    if !seen.insert(prefix.clone()) {
      return Err(Error::DuplicatePath(prefix));
    }
    app = app.merge(resource_routes(
      store,
      resource,
      &shape,
      &prefix,
      config.statuses,
      audit.clone(),
    )?);
    tracing::info!(model = %resource.model, path = %prefix, "mounted resource");
  }

  Ok(app.layer(TraceLayer::new_for_http()))
}

fn resource_routes(
  store: &SqliteStore,
  resource: &ResourceConfig,
  shape: &ModelShape,
  prefix: &str,
  statuses: StatusConfig,
  audit: Arc<dyn AuditLog>,
) -> Result<Router, Error> {
  let service = Arc::new(store.resource(prefix).with_statuses(statuses));

  // Identifier segments follow the prefix segments.
  let offset = prefix.split('/').count();
  let approval = ApprovalConfig {
    offset,
    ..resource.approval.clone()
  };
  let diff = DiffConfig {
    offset,
    ..resource.diff.clone()
  };

  let single = Arc::new(
    ApprovalHandler::new(service.clone(), shape, approval.clone())?
      .with_audit(audit.clone()),
  );
  let batch = Arc::new(
    BatchApprovalHandler::new(service.clone(), shape, approval)?.with_audit(audit.clone()),
  );
  let single_diff =
    Arc::new(DiffHandler::new(service.clone(), shape, diff.clone())?.with_audit(audit.clone()));
  let batch_diff = Arc::new(BatchDiffHandler::new(service, shape, diff)?.with_audit(audit));

  let ids = (0..single.identity().len())
    .map(|i| format!("{{id{i}}}"))
    .collect::<Vec<_>>()
    .join("/");
  let item = format!("/{prefix}/{ids}");
  let many = format!("/{prefix}/batch");

  let router = Router::new()
    .route(&format!("{item}/approve"), {
      let h = single.clone();
      post(move |req: Request| async move { h.approve(req).await })
    })
    .route(&format!("{item}/reject"), {
      let h = single;
      post(move |req: Request| async move { h.reject(req).await })
    })
    .route(&format!("{item}/diff"), {
      let h = single_diff;
      get(move |req: Request| async move { h.diff(req).await })
    })
    .route(&format!("{many}/approve"), {
      let h = batch.clone();
      post(move |req: Request| async move { h.approve(req).await })
    })
    .route(&format!("{many}/reject"), {
      let h = batch;
      post(move |req: Request| async move { h.reject(req).await })
    })
    .route(&format!("{many}/diff"), {
      let h = batch_diff;
      post(move |req: Request| async move { h.diff(req).await })
    });

  Ok(router)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

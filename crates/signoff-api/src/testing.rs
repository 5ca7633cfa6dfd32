//! Recording fakes shared by the handler tests.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use async_trait::async_trait;

use axum::{body::Body, extract::Request, http, response::Response};
use serde_json::Value;
use signoff_core::{
  Identifier,
  diff::DiffRecord,
  service::{ApprovalService, BatchApprovalService, BatchDiffService, DiffService},
  status::StatusConfig,
};

use crate::audit::{AuditContext, AuditEntry, AuditLog, BoxError, ErrorLog};

#[derive(Debug, thiserror::Error)]
#[error("backend unavailable")]
pub struct Unavailable;

pub fn request(method: &str, uri: &str, body: &str) -> Request {
  http::Request::builder()
    .method(method)
    .uri(uri)
    .header("x-user-id", "tester")
    .body(Body::from(body.to_owned()))
    .unwrap()
}

pub async fn body_text(resp: Response) -> String {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(resp: Response) -> Value {
  serde_json::from_str(&body_text(resp).await).unwrap()
}

// ─── Audit ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingAudit {
  entries: Mutex<Vec<(AuditContext, AuditEntry)>>,
}

impl RecordingAudit {
  pub fn entries(&self) -> Vec<(AuditContext, AuditEntry)> {
    self.entries.lock().unwrap().clone()
  }
}

#[async_trait]
impl AuditLog for RecordingAudit {
  async fn log(&self, ctx: &AuditContext, entry: &AuditEntry) -> Result<(), BoxError> {
    self.entries.lock().unwrap().push((ctx.clone(), entry.clone()));
    Ok(())
  }
}

/// Rejects every entry, counting attempts.
#[derive(Default)]
pub struct FailingAudit {
  attempts: Mutex<usize>,
}

impl FailingAudit {
  pub fn attempts(&self) -> usize { *self.attempts.lock().unwrap() }
}

#[async_trait]
impl AuditLog for FailingAudit {
  async fn log(&self, _ctx: &AuditContext, _entry: &AuditEntry) -> Result<(), BoxError> {
    *self.attempts.lock().unwrap() += 1;
    Err("audit table is locked".into())
  }
}

/// An [`ErrorLog`] that keeps every message it is handed.
pub fn recording_error_log() -> (ErrorLog, Arc<Mutex<Vec<String>>>) {
  let messages = Arc::new(Mutex::new(Vec::new()));
  let sink = messages.clone();
  let log = ErrorLog::new(move |_ctx, message| sink.lock().unwrap().push(message.to_owned()));
  (log, messages)
}

// ─── Services ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeApproval {
  fail:  bool,
  calls: Mutex<Vec<(&'static str, Identifier)>>,
}

impl FakeApproval {
  pub fn failing() -> Self {
    Self {
      fail: true,
      ..Default::default()
    }
  }

  pub fn calls(&self) -> Vec<(&'static str, Identifier)> { self.calls.lock().unwrap().clone() }

  fn record(&self, action: &'static str, id: Identifier) -> Result<i32, Unavailable> {
    self.calls.lock().unwrap().push((action, id));
    if self.fail { Err(Unavailable) } else { Ok(StatusConfig::default().success) }
  }
}

impl ApprovalService for FakeApproval {
  type Error = Unavailable;
  type Output = i32;

  async fn approve(&self, id: Identifier) -> Result<i32, Unavailable> { self.record("approve", id) }

  async fn reject(&self, id: Identifier) -> Result<i32, Unavailable> { self.record("reject", id) }
}

/// Succeeds with an output JSON cannot represent: map keys must be strings.
pub struct UnserializableApproval;

impl ApprovalService for UnserializableApproval {
  type Error = Unavailable;
  type Output = HashMap<(i32, i32), i32>;

  async fn approve(&self, _id: Identifier) -> Result<Self::Output, Unavailable> {
    Ok(HashMap::from([((1, 2), 3)]))
  }

  async fn reject(&self, _id: Identifier) -> Result<Self::Output, Unavailable> {
    Ok(HashMap::from([((4, 5), 6)]))
  }
}

#[derive(Default)]
pub struct FakeBatchApproval {
  fail:  bool,
  calls: Mutex<Vec<(&'static str, Vec<Identifier>)>>,
}

impl FakeBatchApproval {
  pub fn failing() -> Self {
    Self {
      fail: true,
      ..Default::default()
    }
  }

  pub fn calls(&self) -> Vec<(&'static str, Vec<Identifier>)> {
    self.calls.lock().unwrap().clone()
  }

  fn record(&self, action: &'static str, ids: Vec<Identifier>) -> Result<i64, Unavailable> {
    let count = ids.len() as i64;
    self.calls.lock().unwrap().push((action, ids));
    if self.fail { Err(Unavailable) } else { Ok(count) }
  }
}

impl BatchApprovalService for FakeBatchApproval {
  type Error = Unavailable;

  async fn approve(&self, ids: Vec<Identifier>) -> Result<i64, Unavailable> {
    self.record("approve", ids)
  }

  async fn reject(&self, ids: Vec<Identifier>) -> Result<i64, Unavailable> {
    self.record("reject", ids)
  }
}

/// Serves canned records: the first one for single lookups, all of them for
/// batch lookups.
#[derive(Default)]
pub struct FakeDiff {
  fail:    bool,
  records: Vec<DiffRecord>,
  calls:   Mutex<Vec<Vec<Identifier>>>,
}

impl FakeDiff {
  pub fn returning(records: Vec<DiffRecord>) -> Self {
    Self {
      records,
      ..Default::default()
    }
  }

  pub fn failing() -> Self {
    Self {
      fail: true,
      ..Default::default()
    }
  }

  pub fn calls(&self) -> Vec<Vec<Identifier>> { self.calls.lock().unwrap().clone() }
}

impl DiffService for FakeDiff {
  type Error = Unavailable;

  async fn diff(&self, id: Identifier) -> Result<Option<DiffRecord>, Unavailable> {
    self.calls.lock().unwrap().push(vec![id]);
    if self.fail {
      return Err(Unavailable);
    }
    Ok(self.records.first().cloned())
  }
}

impl BatchDiffService for FakeDiff {
  type Error = Unavailable;

  async fn diff(&self, ids: Vec<Identifier>) -> Result<Vec<DiffRecord>, Unavailable> {
    self.calls.lock().unwrap().push(ids);
    if self.fail {
      return Err(Unavailable);
    }
    Ok(self.records.clone())
  }
}

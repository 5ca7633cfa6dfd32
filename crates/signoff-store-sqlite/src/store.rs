//! [`SqliteStore`] and the per-resource [`ResourceStore`] service handle.

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use serde_json::Value;
use signoff_core::{
  Identifier,
  diff::DiffRecord,
  service::{ApprovalService, BatchApprovalService, BatchDiffService, DiffService},
  status::StatusConfig,
};

use crate::{
  Error, Result,
  audit::{SqliteAuditLog, StoredAuditEntry},
  encode::{decode_dt, decode_json, encode_dt, encode_key},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A signoff store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// A service handle scoped to `resource`, reporting default status codes.
  pub fn resource(&self, resource: impl Into<String>) -> ResourceStore {
    ResourceStore {
      conn:     self.conn.clone(),
      resource: resource.into(),
      statuses: StatusConfig::default(),
    }
  }

  /// An audit sink writing to this store's `audit_log` table.
  pub fn audit_log(&self) -> SqliteAuditLog { SqliteAuditLog::new(self.conn.clone()) }

  /// Stored audit entries, oldest first, optionally for one resource.
  pub async fn audit_entries(&self, resource: Option<&str>) -> Result<Vec<StoredAuditEntry>> {
    self.audit_log().entries(resource).await
  }
}

// ─── Resource handle ─────────────────────────────────────────────────────────

/// Outcome of the latest decision on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum RecordStatus {
  Approved,
  Rejected,
}

/// The live state of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
  pub value:      Value,
  pub version:    i64,
  pub status:     RecordStatus,
  pub updated_at: chrono::DateTime<Utc>,
}

/// Records and pending changes for one resource.
///
/// Implements all four service contracts. Approve/reject results are codes
/// from the configured [`StatusConfig`].
#[derive(Clone)]
pub struct ResourceStore {
  conn:     tokio_rusqlite::Connection,
  resource: String,
  statuses: StatusConfig,
}

impl ResourceStore {
  pub fn with_statuses(mut self, statuses: StatusConfig) -> Self {
    self.statuses = statuses;
    self
  }

  pub fn name(&self) -> &str { &self.resource }

  /// Write a live value directly, bypassing approval.
  pub async fn put_record(&self, id: &Identifier, value: Value) -> Result<()> {
    let resource   = self.resource.clone();
    let key        = encode_key(id);
    let value_json = value.to_string();
    let now        = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO records (resource, record_key, value_json, version, status, updated_at)
           VALUES (?1, ?2, ?3, 1, ?4, ?5)
           ON CONFLICT (resource, record_key) DO UPDATE SET
             value_json = excluded.value_json,
             version    = records.version + 1,
             status     = excluded.status,
             updated_at = excluded.updated_at",
          rusqlite::params![
            resource,
            key,
            value_json,
            RecordStatus::Approved.to_string(),
            now
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Record a pending change, replacing any earlier one for the same id.
  ///
  /// The draft remembers the record's current version; approving it after
  /// the record has moved on yields `version_error`.
  pub async fn propose(&self, id: &Identifier, value: Value, by: &str) -> Result<()> {
    let resource   = self.resource.clone();
    let key        = encode_key(id);
    let id_json    = id.to_json().to_string();
    let value_json = value.to_string();
    let by         = by.to_owned();
    let now        = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let base_version = current_version(conn, &resource, &key)?;
        conn.execute(
          "INSERT INTO drafts (
             resource, record_key, id_json, value_json, proposed_by, base_version, proposed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (resource, record_key) DO UPDATE SET
             id_json      = excluded.id_json,
             value_json   = excluded.value_json,
             proposed_by  = excluded.proposed_by,
             base_version = excluded.base_version,
             proposed_at  = excluded.proposed_at",
          rusqlite::params![resource, key, id_json, value_json, by, base_version, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The live record for `id`, if one exists.
  pub async fn record(&self, id: &Identifier) -> Result<Option<StoredRecord>> {
    let resource = self.resource.clone();
    let key      = encode_key(id);

    let raw: Option<(String, i64, String, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT value_json, version, status, updated_at FROM records
             WHERE resource = ?1 AND record_key = ?2",
            rusqlite::params![resource, key],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(value_json, version, status, updated_at)| {
        Ok(StoredRecord {
          value: serde_json::from_str(&value_json)?,
          version,
          status: status.parse().map_err(|_| Error::Status(status.clone()))?,
          updated_at: decode_dt(&updated_at)?,
        })
      })
      .transpose()
  }

  /// Apply `decide` to every key inside one transaction, returning the
  /// per-key status codes.
  async fn decide_all(&self, keys: Vec<String>, decide: Decide) -> Result<Vec<i32>> {
    let resource = self.resource.clone();
    let statuses = self.statuses;
    let now      = encode_dt(Utc::now());

    let codes = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let codes = keys
          .iter()
          .map(|key| decide(&tx, &resource, key, &statuses, &now))
          .collect::<rusqlite::Result<Vec<_>>>()?;
        tx.commit()?;
        Ok(codes)
      })
      .await?;
    Ok(codes)
  }

  async fn decide_one(&self, id: &Identifier, decide: Decide) -> Result<i32> {
    let codes = self.decide_all(vec![encode_key(id)], decide).await?;
    Ok(codes.first().copied().unwrap_or(self.statuses.error))
  }

  async fn decide_batch(&self, ids: &[Identifier], decide: Decide) -> Result<i64> {
    let keys = ids.iter().map(encode_key).collect();
    let codes = self.decide_all(keys, decide).await?;
    let succeeded = codes.iter().filter(|c| **c == self.statuses.success).count();
    tracing::debug!(
      resource = %self.resource,
      requested = ids.len(),
      succeeded,
      "batch decision applied"
    );
    Ok(succeeded as i64)
  }

  async fn diffs(&self, ids: &[Identifier]) -> Result<Vec<DiffRecord>> {
    let resource = self.resource.clone();
    let keys: Vec<String> = ids.iter().map(encode_key).collect();

    let raws: Vec<RawDiff> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT d.id_json, r.value_json, d.value_json, d.proposed_by
           FROM drafts d
           LEFT JOIN records r
             ON r.resource = d.resource AND r.record_key = d.record_key
           WHERE d.resource = ?1 AND d.record_key = ?2",
        )?;
        let mut raws = Vec::with_capacity(keys.len());
        for key in &keys {
          let raw = stmt
            .query_row(rusqlite::params![resource, key], |row| {
              Ok(RawDiff {
                id_json:     row.get(0)?,
                origin_json: row.get(1)?,
                value_json:  row.get(2)?,
                proposed_by: row.get(3)?,
              })
            })
            .optional()?;
          raws.extend(raw);
        }
        Ok(raws)
      })
      .await?;

    raws.into_iter().map(RawDiff::into_record).collect()
  }
}

// ─── Decisions ───────────────────────────────────────────────────────────────

type Decide = fn(&Connection, &str, &str, &StatusConfig, &str) -> rusqlite::Result<i32>;

fn current_version(conn: &Connection, resource: &str, key: &str) -> rusqlite::Result<i64> {
  Ok(
    conn
      .query_row(
        "SELECT version FROM records WHERE resource = ?1 AND record_key = ?2",
        rusqlite::params![resource, key],
        |row| row.get(0),
      )
      .optional()?
      .unwrap_or(0),
  )
}

/// Promote the draft for `key` to the live record.
fn approve_key(
  conn: &Connection,
  resource: &str,
  key: &str,
  statuses: &StatusConfig,
  now: &str,
) -> rusqlite::Result<i32> {
  let draft: Option<(String, i64)> = conn
    .query_row(
      "SELECT value_json, base_version FROM drafts WHERE resource = ?1 AND record_key = ?2",
      rusqlite::params![resource, key],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?;
  let Some((value_json, base_version)) = draft else {
    return Ok(statuses.not_found);
  };

  let version = current_version(conn, resource, key)?;
  if version != base_version {
    return Ok(statuses.version_error);
  }

  conn.execute(
    "INSERT INTO records (resource, record_key, value_json, version, status, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT (resource, record_key) DO UPDATE SET
       value_json = excluded.value_json,
       version    = excluded.version,
       status     = excluded.status,
       updated_at = excluded.updated_at",
    rusqlite::params![
      resource,
      key,
      value_json,
      version + 1,
      RecordStatus::Approved.to_string(),
      now
    ],
  )?;
  conn.execute(
    "DELETE FROM drafts WHERE resource = ?1 AND record_key = ?2",
    rusqlite::params![resource, key],
  )?;
  Ok(statuses.success)
}

/// Discard the draft for `key` and mark the live record, if any, rejected.
/// The record's value and version are untouched.
fn reject_key(
  conn: &Connection,
  resource: &str,
  key: &str,
  statuses: &StatusConfig,
  now: &str,
) -> rusqlite::Result<i32> {
  let removed = conn.execute(
    "DELETE FROM drafts WHERE resource = ?1 AND record_key = ?2",
    rusqlite::params![resource, key],
  )?;
  if removed == 0 {
    return Ok(statuses.not_found);
  }
  conn.execute(
    "UPDATE records SET status = ?3, updated_at = ?4
     WHERE resource = ?1 AND record_key = ?2",
    rusqlite::params![resource, key, RecordStatus::Rejected.to_string(), now],
  )?;
  Ok(statuses.success)
}

struct RawDiff {
  id_json:     String,
  origin_json: Option<String>,
  value_json:  String,
  proposed_by: String,
}

impl RawDiff {
  fn into_record(self) -> Result<DiffRecord> {
    Ok(DiffRecord {
      id:     Some(serde_json::from_str(&self.id_json)?),
      origin: decode_json(self.origin_json)?,
      value:  Some(serde_json::from_str(&self.value_json)?),
      by:     self.proposed_by,
    })
  }
}

// ─── Service impls ───────────────────────────────────────────────────────────

impl ApprovalService for ResourceStore {
  type Error = Error;
  type Output = i32;

  async fn approve(&self, id: Identifier) -> Result<i32> {
    self.decide_one(&id, approve_key).await
  }

  async fn reject(&self, id: Identifier) -> Result<i32> {
    self.decide_one(&id, reject_key).await
  }
}

impl BatchApprovalService for ResourceStore {
  type Error = Error;

  async fn approve(&self, ids: Vec<Identifier>) -> Result<i64> {
    self.decide_batch(&ids, approve_key).await
  }

  async fn reject(&self, ids: Vec<Identifier>) -> Result<i64> {
    self.decide_batch(&ids, reject_key).await
  }
}

impl DiffService for ResourceStore {
  type Error = Error;

  async fn diff(&self, id: Identifier) -> Result<Option<DiffRecord>> {
    Ok(self.diffs(std::slice::from_ref(&id)).await?.into_iter().next())
  }
}

impl BatchDiffService for ResourceStore {
  type Error = Error;

  async fn diff(&self, ids: Vec<Identifier>) -> Result<Vec<DiffRecord>> {
    self.diffs(&ids).await
  }
}

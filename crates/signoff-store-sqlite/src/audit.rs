//! Persistent audit sink.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use signoff_core::audit::{AuditContext, AuditEntry, AuditLog, BoxError};
use uuid::Uuid;

use crate::{
  Result,
  encode::{decode_dt, decode_uuid, encode_dt, encode_uuid},
};

/// An audit entry as read back from the `audit_log` table.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAuditEntry {
  pub audit_id:    Uuid,
  pub context:     AuditContext,
  pub entry:       AuditEntry,
  pub recorded_at: DateTime<Utc>,
}

/// Appends audit entries to the store's `audit_log` table.
#[derive(Clone)]
pub struct SqliteAuditLog {
  conn: tokio_rusqlite::Connection,
}

impl SqliteAuditLog {
  pub(crate) fn new(conn: tokio_rusqlite::Connection) -> Self { Self { conn } }

  async fn append(&self, ctx: &AuditContext, entry: &AuditEntry) -> Result<Uuid> {
    let audit_id    = Uuid::new_v4();
    let id_str      = encode_uuid(audit_id);
    let resource    = entry.resource.clone();
    let action      = entry.action.clone();
    let success     = entry.success;
    let description = entry.description.clone();
    let user        = ctx.user.clone();
    let ip          = ctx.ip.clone();
    let path        = ctx.path.clone();
    let now         = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_log (
             audit_id, resource, action, success, description,
             user_id, ip, path, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            resource,
            action,
            success,
            description,
            user,
            ip,
            path,
            now
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(audit_id)
  }

  /// Entries for `resource`, oldest first. `None` returns every entry.
  pub async fn entries(&self, resource: Option<&str>) -> Result<Vec<StoredAuditEntry>> {
    let resource = resource.map(str::to_owned);

    let rows: Vec<RawAudit> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT audit_id, resource, action, success, description,
                  user_id, ip, path, recorded_at
           FROM audit_log
           WHERE ?1 IS NULL OR resource = ?1
           ORDER BY recorded_at ASC, rowid ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![resource], |row| {
            Ok(RawAudit {
              audit_id:    row.get(0)?,
              resource:    row.get(1)?,
              action:      row.get(2)?,
              success:     row.get(3)?,
              description: row.get(4)?,
              user:        row.get(5)?,
              ip:          row.get(6)?,
              path:        row.get(7)?,
              recorded_at: row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows.into_iter().map(RawAudit::into_entry).collect()
  }
}

#[async_trait]
impl AuditLog for SqliteAuditLog {
  async fn log(&self, ctx: &AuditContext, entry: &AuditEntry) -> Result<(), BoxError> {
    let audit_id = self.append(ctx, entry).await?;
    tracing::debug!(%audit_id, resource = %entry.resource, "audit entry stored");
    Ok(())
  }
}

struct RawAudit {
  audit_id:    String,
  resource:    String,
  action:      String,
  success:     bool,
  description: String,
  user:        Option<String>,
  ip:          Option<String>,
  path:        String,
  recorded_at: String,
}

impl RawAudit {
  fn into_entry(self) -> Result<StoredAuditEntry> {
    Ok(StoredAuditEntry {
      audit_id:    decode_uuid(&self.audit_id)?,
      context:     AuditContext {
        user: self.user,
        ip:   self.ip,
        path: self.path,
      },
      entry:       AuditEntry {
        resource:    self.resource,
        action:      self.action,
        success:     self.success,
        description: self.description,
      },
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

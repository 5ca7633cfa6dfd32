//! SQLite backend for signoff's approval, diff, and audit contracts.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. One [`SqliteStore`] holds any
//! number of resources; [`SqliteStore::resource`] hands out a
//! [`ResourceStore`] scoped to one of them.

mod audit;
mod encode;
mod schema;
mod store;

pub mod error;

pub use audit::{SqliteAuditLog, StoredAuditEntry};
pub use error::{Error, Result};
pub use store::{RecordStatus, ResourceStore, SqliteStore, StoredRecord};

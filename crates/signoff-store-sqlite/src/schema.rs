//! SQL schema for the signoff SQLite store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Live values. `version` increments on every approval; `status` records the
-- outcome of the latest decision.
CREATE TABLE IF NOT EXISTS records (
    resource    TEXT    NOT NULL,
    record_key  TEXT    NOT NULL,   -- [key, value] pairs, identifier order
    value_json  TEXT    NOT NULL,
    version     INTEGER NOT NULL,
    status      TEXT    NOT NULL DEFAULT 'approved',  -- approved | rejected
    updated_at  TEXT    NOT NULL,   -- ISO 8601 UTC
    PRIMARY KEY (resource, record_key)
);

-- At most one pending change per record.
CREATE TABLE IF NOT EXISTS drafts (
    resource     TEXT    NOT NULL,
    record_key   TEXT    NOT NULL,
    id_json      TEXT    NOT NULL,  -- identifier as written in diff output
    value_json   TEXT    NOT NULL,
    proposed_by  TEXT    NOT NULL DEFAULT '',
    base_version INTEGER NOT NULL,  -- records.version when proposed; 0 if new
    proposed_at  TEXT    NOT NULL,
    PRIMARY KEY (resource, record_key)
);

CREATE TABLE IF NOT EXISTS audit_log (
    audit_id    TEXT    PRIMARY KEY,
    resource    TEXT    NOT NULL,
    action      TEXT    NOT NULL,
    success     INTEGER NOT NULL,
    description TEXT    NOT NULL DEFAULT '',
    user_id     TEXT,
    ip          TEXT,
    path        TEXT    NOT NULL DEFAULT '',
    recorded_at TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS audit_log_resource_idx ON audit_log(resource, recorded_at);

PRAGMA user_version = 1;
";

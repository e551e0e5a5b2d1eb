//! SQL schema for the Medala SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision; opening a database stamped with a newer revision fails.

pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per key. Writes overwrite; there is no history.
CREATE TABLE IF NOT EXISTS events (
    key         TEXT PRIMARY KEY,
    value_json  TEXT NOT NULL,
    written_at  TEXT NOT NULL    -- RFC 3339 UTC; server-assigned
) WITHOUT ROWID;

PRAGMA user_version = 1;
";

use rusqlite::Connection;

use crate::error::QueueError;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), QueueError> {
    // synchronous = FULL: an enqueued sale must survive power loss,
    // not just a process crash.
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = FULL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS sale_queue (
    rowid INTEGER PRIMARY KEY,
    intent_id BLOB NOT NULL UNIQUE CHECK (length(intent_id) = 16),
    store_id TEXT NOT NULL,
    receipt_number TEXT NOT NULL,
    payload BLOB NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    attempts INTEGER NOT NULL DEFAULT 0,
    fail_reason TEXT,
    enqueued_at INTEGER NOT NULL,
    last_attempt_at INTEGER
);
CREATE INDEX IF NOT EXISTS idx_sale_queue_status ON sale_queue (status, rowid);
";

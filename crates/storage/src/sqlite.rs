use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use tillsync_core::{IntentId, SaleIntent};

use crate::error::QueueError;
use crate::traits::{QueueRecord, QueueStatus, SaleQueue};

/// Sqlite-backed `SaleQueue`. One transaction per mutation; the schema
/// runs with `synchronous = FULL` so an acknowledged enqueue survives
/// power loss.
pub struct SqliteQueue {
    conn: Connection,
}

impl SqliteQueue {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory queue for tests that do not exercise restart behavior.
    pub fn open_in_memory() -> Result<Self, QueueError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn millis_to_datetime(ms: i64, label: &str) -> Result<DateTime<Utc>, QueueError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| QueueError::Serialization(format!("invalid {label} timestamp: {ms}")))
}

fn to_record(
    payload: Vec<u8>,
    status: String,
    attempts: i64,
    fail_reason: Option<String>,
    enqueued_at: i64,
    last_attempt_at: Option<i64>,
) -> Result<QueueRecord, QueueError> {
    let intent = SaleIntent::from_msgpack(&payload)
        .map_err(|e| QueueError::Serialization(e.to_string()))?;
    let last_attempt_at = match last_attempt_at {
        Some(ms) => Some(millis_to_datetime(ms, "last_attempt_at")?),
        None => None,
    };
    Ok(QueueRecord {
        intent,
        status: QueueStatus::parse(&status)?,
        attempts: attempts as u32,
        fail_reason,
        enqueued_at: millis_to_datetime(enqueued_at, "enqueued_at")?,
        last_attempt_at,
    })
}

type RawRow = (Vec<u8>, String, i64, Option<String>, i64, Option<i64>);

impl SqliteQueue {
    fn list_by_status(&self, status: QueueStatus) -> Result<Vec<QueueRecord>, QueueError> {
        let mut stmt = self.conn.prepare(
            "SELECT payload, status, attempts, fail_reason, enqueued_at, last_attempt_at
             FROM sale_queue WHERE status = ?1 ORDER BY rowid",
        )?;
        let rows: Vec<RawRow> = stmt
            .query_map(rusqlite::params![status.as_str()], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(payload, status, attempts, reason, enq, last)| {
                to_record(payload, status, attempts, reason, enq, last)
            })
            .collect()
    }
}

impl SaleQueue for SqliteQueue {
    fn enqueue(&mut self, intent: &SaleIntent, now: DateTime<Utc>) -> Result<(), QueueError> {
        let payload = intent
            .to_msgpack()
            .map_err(|e| QueueError::Serialization(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO sale_queue (intent_id, store_id, receipt_number, payload, status, enqueued_at)
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
            rusqlite::params![
                intent.id.as_bytes().as_slice(),
                intent.store_id.as_str(),
                intent.receipt_number,
                payload,
                now.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn list_pending(&self) -> Result<Vec<QueueRecord>, QueueError> {
        self.list_by_status(QueueStatus::Pending)
    }

    fn list_failed(&self) -> Result<Vec<QueueRecord>, QueueError> {
        self.list_by_status(QueueStatus::Failed)
    }

    fn get(&self, id: IntentId) -> Result<Option<QueueRecord>, QueueError> {
        let row: Option<RawRow> = self
            .conn
            .query_row(
                "SELECT payload, status, attempts, fail_reason, enqueued_at, last_attempt_at
                 FROM sale_queue WHERE intent_id = ?1",
                rusqlite::params![id.as_bytes().as_slice()],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((payload, status, attempts, reason, enq, last)) => {
                Ok(Some(to_record(payload, status, attempts, reason, enq, last)?))
            }
            None => Ok(None),
        }
    }

    fn mark_attempt(&mut self, id: IntentId, now: DateTime<Utc>) -> Result<(), QueueError> {
        let updated = self.conn.execute(
            "UPDATE sale_queue SET attempts = attempts + 1, last_attempt_at = ?1 WHERE intent_id = ?2",
            rusqlite::params![now.timestamp_millis(), id.as_bytes().as_slice()],
        )?;
        if updated == 0 {
            return Err(QueueError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn complete(&mut self, id: IntentId) -> Result<(), QueueError> {
        self.conn.execute(
            "DELETE FROM sale_queue WHERE intent_id = ?1",
            rusqlite::params![id.as_bytes().as_slice()],
        )?;
        Ok(())
    }

    fn fail(&mut self, id: IntentId, reason: &str) -> Result<(), QueueError> {
        let updated = self.conn.execute(
            "UPDATE sale_queue SET status = 'failed', fail_reason = ?1 WHERE intent_id = ?2",
            rusqlite::params![reason, id.as_bytes().as_slice()],
        )?;
        if updated == 0 {
            return Err(QueueError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn pending_count(&self) -> Result<u64, QueueError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sale_queue WHERE status = 'pending'",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
